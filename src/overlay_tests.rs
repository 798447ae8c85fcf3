use super::*;
use crate::host::MemoryPage;
use tokio::sync::mpsc;

type PageRef = Arc<Mutex<MemoryPage>>;

fn spawn_agent(
    page: MemoryPage,
) -> (AgentHandle, PageRef, mpsc::UnboundedReceiver<BackgroundMessage>) {
    let page = Arc::new(Mutex::new(page));
    let surface: Arc<Mutex<dyn PageSurface>> = page.clone();
    let (bg_tx, bg_rx) = mpsc::unbounded_channel();
    (AgentHandle::spawn(surface, bg_tx), page, bg_rx)
}

/// Let the agent task drain its mailbox. Gestures carry no reply to await.
async fn settle() {
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
}

#[tokio::test]
async fn selection_prefers_the_focused_field() {
    let mut page = MemoryPage::with_field("Hello world", 0, 5);
    page.doc_selection = "document selection".to_string();
    let (agent, _page, _bg) = spawn_agent(page);

    let resp = agent.deliver(AgentRequest::GetSelection).await.unwrap();
    assert_eq!(resp, AgentResponse::Selection { text: "Hello".to_string() });
}

#[tokio::test]
async fn unfocused_field_falls_back_to_the_document_selection() {
    let mut page = MemoryPage::with_field("Hello world", 0, 5);
    page.field.as_mut().unwrap().focused = false;
    page.doc_selection = "from the document".to_string();
    let (agent, _page, _bg) = spawn_agent(page);

    let resp = agent.deliver(AgentRequest::GetSelection).await.unwrap();
    assert_eq!(resp, AgentResponse::Selection { text: "from the document".to_string() });
}

#[tokio::test]
async fn repeated_show_loading_updates_the_single_instance() {
    let (agent, page, _bg) = spawn_agent(MemoryPage::new());

    agent.deliver(AgentRequest::ShowLoading).await.unwrap();
    agent.deliver(AgentRequest::ShowLoading).await.unwrap();

    let page = page.lock().unwrap();
    assert_eq!(page.loading.as_deref(), Some(LOADING_TEXT));
    // Both shows rendered into the same region; nothing ever stacked.
    let loading_renders = page
        .render_log
        .iter()
        .filter(|(region, _)| *region == OverlayRegion::Loading)
        .count();
    assert_eq!(loading_renders, 2);
}

#[tokio::test]
async fn hide_loading_is_idempotent() {
    let (agent, page, _bg) = spawn_agent(MemoryPage::new());

    agent.deliver(AgentRequest::ShowLoading).await.unwrap();
    agent.deliver(AgentRequest::HideLoading).await.unwrap();
    agent.deliver(AgentRequest::HideLoading).await.unwrap();

    let page = page.lock().unwrap();
    assert!(page.loading.is_none());
    let removals = page
        .render_log
        .iter()
        .filter(|(region, content)| *region == OverlayRegion::Loading && content.is_none())
        .count();
    assert_eq!(removals, 1);
}

#[tokio::test]
async fn escape_tears_down_loading_and_requests_a_cancel() {
    let (agent, page, mut bg) = spawn_agent(MemoryPage::new());

    agent.deliver(AgentRequest::ShowLoading).await.unwrap();
    agent.gesture(Gesture::EscapeKey);
    settle().await;

    assert!(page.lock().unwrap().loading.is_none());
    assert!(matches!(bg.try_recv(), Ok(BackgroundMessage::CancelTranslation { .. })));
}

#[tokio::test]
async fn escape_without_a_loading_widget_does_nothing() {
    let (agent, page, mut bg) = spawn_agent(MemoryPage::new());

    agent.gesture(Gesture::EscapeKey);
    settle().await;

    assert!(bg.try_recv().is_err());
    assert!(page.lock().unwrap().render_log.is_empty());
}

#[tokio::test]
async fn popup_path_shows_the_translation_and_copies_it() {
    let (agent, page, _bg) = spawn_agent(MemoryPage::with_selection("Hello world"));

    agent
        .deliver(AgentRequest::ShowTranslation {
            translated: "안녕 세상".to_string(),
            replace_selection: false,
        })
        .await
        .unwrap();

    let page = page.lock().unwrap();
    assert_eq!(page.result.as_deref(), Some("안녕 세상"));
    assert_eq!(page.clipboard.as_deref(), Some("안녕 세상"));
}

#[tokio::test]
async fn replace_path_splices_the_field_and_shows_a_confirmation() {
    let (agent, page, _bg) = spawn_agent(MemoryPage::with_field("Hello world", 0, 5));

    agent
        .deliver(AgentRequest::ShowTranslation {
            translated: "안녕 세상".to_string(),
            replace_selection: true,
        })
        .await
        .unwrap();

    let page = page.lock().unwrap();
    let field = page.field.as_ref().unwrap();
    assert_eq!(field.value, "안녕 세상 world");
    // Caret sits just past the inserted text.
    assert_eq!(field.sel_start, 5);
    assert_eq!(field.sel_end, 5);
    // The widget confirms the replacement instead of repeating the text.
    assert_eq!(page.result.as_deref(), Some(REPLACED_TEXT));
    assert_eq!(page.clipboard.as_deref(), Some("안녕 세상"));
}

#[tokio::test]
async fn replace_path_covers_rich_content_selections_too() {
    let (agent, page, _bg) = spawn_agent(MemoryPage::with_selection("Hello world"));

    agent
        .deliver(AgentRequest::ShowTranslation {
            translated: "안녕 세상".to_string(),
            replace_selection: true,
        })
        .await
        .unwrap();

    let page = page.lock().unwrap();
    assert_eq!(page.replaced_doc_text.as_deref(), Some("안녕 세상"));
    assert_eq!(page.result.as_deref(), Some(REPLACED_TEXT));
}

#[tokio::test]
async fn replace_request_without_a_replaceable_selection_falls_back_to_popup() {
    let (agent, page, _bg) = spawn_agent(MemoryPage::new());

    agent
        .deliver(AgentRequest::ShowTranslation {
            translated: "안녕".to_string(),
            replace_selection: true,
        })
        .await
        .unwrap();

    assert_eq!(page.lock().unwrap().result.as_deref(), Some("안녕"));
}

#[tokio::test]
async fn clipboard_failure_is_swallowed() {
    let mut base = MemoryPage::with_selection("Hello");
    base.clipboard_writable = false;
    let (agent, page, _bg) = spawn_agent(base);

    agent
        .deliver(AgentRequest::ShowTranslation {
            translated: "안녕".to_string(),
            replace_selection: false,
        })
        .await
        .unwrap();

    let page = page.lock().unwrap();
    assert_eq!(page.result.as_deref(), Some("안녕"));
    assert!(page.clipboard.is_none());
}

#[tokio::test]
async fn empty_translation_renders_nothing() {
    let (agent, page, _bg) = spawn_agent(MemoryPage::new());

    agent
        .deliver(AgentRequest::ShowTranslation {
            translated: String::new(),
            replace_selection: false,
        })
        .await
        .unwrap();

    assert!(page.lock().unwrap().render_log.is_empty());
}

#[tokio::test(start_paused = true)]
async fn result_expires_and_a_late_dismiss_is_a_noop() {
    let (agent, page, _bg) = spawn_agent(MemoryPage::with_selection("x"));

    agent
        .deliver(AgentRequest::ShowTranslation {
            translated: "done".to_string(),
            replace_selection: false,
        })
        .await
        .unwrap();

    tokio::time::sleep(RESULT_TTL + Duration::from_millis(100)).await;
    settle().await;
    assert!(page.lock().unwrap().result.is_none());

    let renders = page.lock().unwrap().render_log.len();
    agent.gesture(Gesture::DismissResult);
    settle().await;
    assert_eq!(page.lock().unwrap().render_log.len(), renders);
}

#[tokio::test(start_paused = true)]
async fn a_stale_timer_cannot_touch_a_refreshed_result() {
    let (agent, page, _bg) = spawn_agent(MemoryPage::with_selection("x"));

    agent
        .deliver(AgentRequest::ShowTranslation {
            translated: "one".to_string(),
            replace_selection: false,
        })
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_secs(4)).await;
    agent.gesture(Gesture::DismissResult);
    settle().await;

    agent
        .deliver(AgentRequest::ShowTranslation {
            translated: "two".to_string(),
            replace_selection: false,
        })
        .await
        .unwrap();

    // The first widget's timer elapses here; its epoch is stale.
    tokio::time::sleep(Duration::from_secs(5)).await;
    settle().await;
    assert_eq!(page.lock().unwrap().result.as_deref(), Some("two"));

    // The second widget's own timer still works.
    tokio::time::sleep(Duration::from_secs(4)).await;
    settle().await;
    assert!(page.lock().unwrap().result.is_none());
}

#[tokio::test(start_paused = true)]
async fn a_lost_hide_cannot_strand_the_spinner() {
    let (agent, page, _bg) = spawn_agent(MemoryPage::new());

    agent.deliver(AgentRequest::ShowLoading).await.unwrap();
    tokio::time::sleep(LOADING_TTL + Duration::from_secs(1)).await;
    settle().await;

    assert!(page.lock().unwrap().loading.is_none());
}
