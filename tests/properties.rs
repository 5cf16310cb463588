use proptest::prelude::*;
use runviz::curves::curve::generate_id;
use runviz::curves::curve_manager::{CurveEvent, CurveManager};
use runviz::fitter::fit::{FitError, FitOptions, fit};
use runviz::fitter::models::available_models;
use runviz::plot::render::RenderHandle;
use runviz::plot::style::CurveStyle;

fn add(manager: &mut CurveManager, id: &str, y: Vec<f64>) {
    manager
        .add_curve(
            id.to_owned(),
            RenderHandle(0),
            None,
            y,
            id.to_owned(),
            CurveStyle::data("r", "o"),
            None,
        )
        .unwrap();
}

proptest! {
    #[test]
    fn generated_ids_are_injective(
        a in ("[a-z|\\\\]{0,4}", "[a-z|\\\\]{0,4}", "[a-z|\\\\]{0,4}"),
        b in ("[a-z|\\\\]{0,4}", "[a-z|\\\\]{0,4}", "[a-z|\\\\]{0,4}"),
    ) {
        let id_a = generate_id(&a.0, &a.1, &a.2);
        let id_b = generate_id(&b.0, &b.1, &b.2);
        prop_assert_eq!(id_a == id_b, a == b);
        prop_assert_eq!(id_a, generate_id(&a.0, &a.1, &a.2));
    }

    #[test]
    fn transform_depends_only_on_final_values(
        y in prop::collection::vec(-1e3f64..1e3, 1..20),
        offset in -100.0f64..100.0,
        factor in -10.0f64..10.0,
    ) {
        let mut first = CurveManager::new();
        add(&mut first, "c", y.clone());
        first.update_offset_factor("c", offset, factor);
        first.update_derivative("c", true);
        first.update_derivative("c", false);

        let mut second = CurveManager::new();
        add(&mut second, "c", y.clone());
        second.update_derivative("c", true);
        second.update_offset_factor("c", offset, factor);
        second.update_derivative("c", false);

        let (_, y_first) = first.get_xy_data("c").unwrap();
        let (_, y_second) = second.get_xy_data("c").unwrap();
        prop_assert_eq!(&y_first, &y_second);
        for (shown, raw) in y_first.iter().zip(&y) {
            prop_assert!((shown - (factor * raw + offset)).abs() < 1e-9);
        }
    }

    #[test]
    fn add_then_remove_restores_order(count in 0usize..6, extra in "[a-z]{1,3}") {
        let mut manager = CurveManager::new();
        for i in 0..count {
            add(&mut manager, &format!("curve{i}"), vec![1.0]);
        }
        let before = manager.ids();

        add(&mut manager, &extra, vec![2.0, 3.0]);
        manager.remove_curve(&extra);

        prop_assert_eq!(manager.ids(), before);
    }
}

#[test]
fn remove_all_emits_one_batch() {
    for count in [0, 1, 5] {
        let mut manager = CurveManager::new();
        for i in 0..count {
            add(&mut manager, &format!("curve{i}"), vec![1.0]);
        }
        let events = manager.events.subscribe();

        manager.remove_all_curves();

        let received: Vec<CurveEvent> = events.try_iter().collect();
        assert_eq!(received.len(), 1);
        assert!(matches!(&received[0], CurveEvent::AllRemoved(removed) if removed.len() == count));
    }
}

#[test]
fn bad_ranges_are_rejected() {
    let x: Vec<f64> = (0..20).map(f64::from).collect();
    let y: Vec<f64> = x.iter().map(|x| 2.0 * x + 1.0).collect();
    let model = available_models()[4];

    for range in [(5.0, 5.0), (6.0, 2.0), (f64::NAN, 1.0)] {
        let options = FitOptions {
            x_range: Some(range),
            ..Default::default()
        };
        assert!(matches!(
            fit(&x, &y, model, &options),
            Err(FitError::InvalidRange { .. })
        ));
    }

    let options = FitOptions {
        x_range: Some((100.0, 200.0)),
        ..Default::default()
    };
    assert!(matches!(
        fit(&x, &y, model, &options),
        Err(FitError::EmptyRange { .. })
    ));
}
