mod common;

use common::{config_for, page_drawn, ScriptedDocument, ScriptedRenderer};
use pdfpager_core::{
    ContainerSize, LoadError, PageDriver, QueuePolicy, RenderController, RenderError,
    ViewerConfig,
};
use pretty_assertions::assert_eq;
use std::path::PathBuf;

async fn started(document: &ScriptedDocument, config: &ViewerConfig) -> RenderController<ScriptedDocument> {
    let controller = RenderController::new(document.clone(), config);
    controller.start().await.unwrap();
    controller
}

async fn wait_for_start(document: &ScriptedDocument, page: u32) {
    while !document.started().contains(&page) {
        tokio::task::yield_now().await;
    }
}

#[tokio::test]
async fn opens_and_renders_first_page() {
    let document = ScriptedDocument::new(10);
    let renderer = ScriptedRenderer::default().with_document("manual.pdf", document.clone());
    let config = config_for("manual.pdf");

    let controller = RenderController::open(&renderer, &config).await.unwrap();
    assert!(!controller.controls().any_enabled());

    controller.start().await.unwrap();
    let state = controller.state();
    assert_eq!(state.current_page, 1);
    assert_eq!(state.total_pages, 10);
    assert!(!state.is_rendering);
    assert_eq!(document.rendered(), vec![1]);

    let controls = controller.controls();
    assert!(!controls.previous);
    assert!(controls.next);
    assert_eq!(controls.zoom_label, "150%");
    assert_eq!(*controller.subscribe().borrow(), controls);
}

#[tokio::test]
async fn missing_document_is_a_load_error() {
    let renderer = ScriptedRenderer::default();
    let result = RenderController::open(&renderer, &config_for("absent.pdf")).await;
    assert_eq!(
        result.err(),
        Some(LoadError::NotFound(PathBuf::from("absent.pdf")))
    );
}

#[tokio::test]
async fn out_of_range_pages_are_clamped() {
    let document = ScriptedDocument::new(10);
    let controller = started(&document, &config_for("manual.pdf")).await;

    controller.go_to_page(0).await.unwrap();
    assert_eq!(controller.state().current_page, 1);
    assert_eq!(document.rendered(), vec![1]);

    controller.go_to_page(15).await.unwrap();
    assert_eq!(controller.state().current_page, 10);

    controller.next_page().await.unwrap();
    assert_eq!(controller.state().current_page, 10);
    assert_eq!(document.rendered(), vec![1, 10]);
}

#[tokio::test]
async fn zoom_in_stops_at_max_scale() {
    let document = ScriptedDocument::new(3);
    let controller = started(&document, &config_for("manual.pdf")).await;

    for _ in 0..20 {
        controller.zoom_in().await.unwrap();
    }
    assert_eq!(controller.state().scale, 4.0);
    assert_eq!(controller.controls().zoom_label, "400%");
    assert!(!controller.controls().zoom_in);

    for _ in 0..40 {
        controller.change_zoom(-0.3).await.unwrap();
    }
    assert_eq!(controller.state().scale, 0.4);
    assert!(!controller.controls().zoom_out);
}

#[tokio::test]
async fn pending_page_renders_when_current_render_finishes() {
    let (document, gate) = ScriptedDocument::gated(10);
    gate.add_permits(1);
    let controller = started(&document, &config_for("manual.pdf")).await;

    let navigate = controller.go_to_page(3);
    let interrupt = async {
        wait_for_start(&document, 3).await;
        assert!(controller.state().is_rendering);
        assert_eq!(controller.controls().surface_opacity, 0.5);

        controller.go_to_page(4).await.unwrap();
        controller.go_to_page(5).await.unwrap();
        assert_eq!(controller.state().pending_page, Some(5));
        gate.add_permits(2);
    };
    let (result, ()) = tokio::join!(navigate, interrupt);
    result.unwrap();

    assert_eq!(document.rendered(), vec![1, 3, 5]);
    assert_eq!(controller.state().current_page, 5);
    assert_eq!(controller.state().pending_page, None);
    assert_eq!(document.max_concurrent(), 1);
}

#[tokio::test]
async fn zoom_during_render_redraws_at_new_scale() {
    let (document, gate) = ScriptedDocument::gated(10);
    gate.add_permits(1);
    let controller = started(&document, &config_for("manual.pdf")).await;

    let navigate = controller.go_to_page(3);
    let interrupt = async {
        wait_for_start(&document, 3).await;
        controller.zoom_in().await.unwrap();
        let state = controller.state();
        assert!((state.scale - 1.7).abs() < 1e-6);
        assert_eq!(state.pending_page, Some(3));
        gate.add_permits(2);
    };
    let (result, ()) = tokio::join!(navigate, interrupt);
    result.unwrap();

    assert_eq!(document.rendered(), vec![1, 3, 3]);
    assert_eq!(controller.state().current_page, 3);
    assert_eq!(controller.state().pending_page, None);
    let frame = controller.frame().await;
    assert_eq!(frame.width(), (612.0f32 * controller.state().scale).floor() as u32);
    assert_eq!(page_drawn(&frame), 3);
}

#[tokio::test]
async fn reject_policy_drops_requests_during_render() {
    let (document, gate) = ScriptedDocument::gated(10);
    gate.add_permits(1);
    let config = ViewerConfig {
        queue_policy: QueuePolicy::Reject,
        ..config_for("manual.pdf")
    };
    let controller = started(&document, &config).await;

    let navigate = controller.go_to_page(3);
    let interrupt = async {
        wait_for_start(&document, 3).await;
        controller.go_to_page(5).await.unwrap();
        controller.zoom_in().await.unwrap();
        assert_eq!(controller.state().pending_page, None);
        gate.add_permits(1);
    };
    let (result, ()) = tokio::join!(navigate, interrupt);
    result.unwrap();

    assert_eq!(document.rendered(), vec![1, 3]);
    assert_eq!(controller.state().current_page, 3);
    assert_eq!(controller.state().scale, 1.5);
}

#[tokio::test]
async fn render_failure_returns_to_idle() {
    let document = ScriptedDocument::new(10);
    document.fail_page(4);
    let controller = started(&document, &config_for("manual.pdf")).await;

    let err = controller.go_to_page(4).await.unwrap_err();
    assert_eq!(err.page(), Some(4));
    assert!(matches!(err, RenderError::Rasterize { .. }));

    let state = controller.state();
    assert_eq!(state.current_page, 1);
    assert!(!state.is_rendering);
    assert!(controller.notice().is_some());
    assert!(controller.controls().next);

    document.heal_page(4);
    controller.go_to_page(4).await.unwrap();
    assert_eq!(controller.state().current_page, 4);
    assert_eq!(controller.notice(), None);
}

#[tokio::test]
async fn surface_is_sized_and_fitted_to_container() {
    let document = ScriptedDocument::new(2);
    let controller = started(&document, &config_for("manual.pdf")).await;

    let frame = controller.frame().await;
    assert_eq!((frame.width(), frame.height()), (918, 1188));
    assert_eq!(page_drawn(&frame), 1);

    controller.set_container(Some(ContainerSize {
        width: 652.0,
        height: 5000.0,
    }));
    controller.next_page().await.unwrap();
    let frame = controller.frame().await;
    assert_eq!((frame.width(), frame.height()), (612, 792));
    assert_eq!(page_drawn(&frame), 2);
    // The indicator keeps the requested zoom.
    assert_eq!(controller.controls().zoom_label, "150%");
}

#[tokio::test]
async fn forced_render_redraws_current_page() {
    let document = ScriptedDocument::new(5);
    let controller = started(&document, &config_for("manual.pdf")).await;

    controller.render(1).await.unwrap();
    assert_eq!(document.rendered(), vec![1, 1]);

    let unloaded = RenderController::new(ScriptedDocument::new(5), &config_for("manual.pdf"));
    assert_eq!(unloaded.render(2).await, Err(RenderError::NoDocument));
}
