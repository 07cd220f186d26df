#![cfg(feature = "ufo")]

use outlinecheck::{test_font, CheckConfig, FontRunOptions, TestId, TestSelection};

fn contour(points: &[(f64, f64)]) -> norad::Contour {
    let points = points
        .iter()
        .map(|&(x, y)| norad::ContourPoint::new(x, y, norad::PointType::Line, false, None, None))
        .collect();
    norad::Contour::new(points, None)
}

#[test]
fn checks_a_saved_ufo() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("Test.ufo");

    let mut ufo = norad::Font::new();
    ufo.font_info.x_height = Some(500.0);

    let mut o = norad::Glyph::new("o");
    o.width = 600.0;
    o.codepoints.insert('o');
    o.contours.push(contour(&[(50.0, 0.0), (550.0, 0.0), (550.0, 500.0), (50.0, 500.0)]));
    ufo.default_layer_mut().insert_glyph(o);

    let mut period = norad::Glyph::new("period");
    period.width = 4.0;
    period.contours.push(contour(&[(1.0, 0.0), (3.0, 0.0), (3.0, 2.0), (1.0, 2.0)]));
    period.contours.push(contour(&[(200.0, 200.0)]));
    ufo.default_layer_mut().insert_glyph(period);
    ufo.save(&path).unwrap();

    let font = outlinecheck::ufo::load(&path).unwrap();
    assert_eq!(font.len(), 2);
    let report = test_font(
        &font,
        &TestSelection::all(),
        &CheckConfig::default(),
        FontRunOptions::default(),
    )
    .unwrap();

    assert!(report.get("o").is_none());
    let period = report.get("period").unwrap();
    assert!(period.contour_finding(TestId::SmallContours, 0).is_some());
    assert!(period.contour_finding(TestId::StrayPoints, 1).is_some());
}
