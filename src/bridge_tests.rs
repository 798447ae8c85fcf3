use super::*;
use std::sync::Mutex;

/// Scripted host: a queue of deliver outcomes plus an injection policy.
struct FakeHost {
    deliveries: Mutex<Vec<Result<AgentResponse, HostError>>>,
    inject_result: Mutex<Option<HostError>>,
    delivered: Mutex<u32>,
    injected: Mutex<u32>,
}

impl FakeHost {
    fn new(deliveries: Vec<Result<AgentResponse, HostError>>) -> Self {
        Self {
            deliveries: Mutex::new(deliveries),
            inject_result: Mutex::new(None),
            delivered: Mutex::new(0),
            injected: Mutex::new(0),
        }
    }

    fn refusing_injection(deliveries: Vec<Result<AgentResponse, HostError>>) -> Self {
        let host = Self::new(deliveries);
        *host.inject_result.lock().unwrap() =
            Some(HostError::Refused("privileged page".to_string()));
        host
    }
}

#[async_trait::async_trait]
impl AgentHost for FakeHost {
    async fn deliver(&self, _tab: TabId, _req: AgentRequest) -> Result<AgentResponse, HostError> {
        *self.delivered.lock().unwrap() += 1;
        self.deliveries.lock().unwrap().remove(0)
    }

    async fn inject_agent(&self, _tab: TabId) -> Result<(), HostError> {
        *self.injected.lock().unwrap() += 1;
        match self.inject_result.lock().unwrap().take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn tab_url(&self, _tab: TabId) -> Option<String> {
        Some("https://example.com/".to_string())
    }
}

const TAB: TabId = TabId(1);

#[tokio::test]
async fn direct_delivery_needs_no_injection() {
    let host = Arc::new(FakeHost::new(vec![Ok(AgentResponse::Ack)]));
    let bridge = AgentBridge::new(host.clone());

    bridge.send(TAB, AgentRequest::ShowLoading).await.unwrap();
    assert_eq!(*host.delivered.lock().unwrap(), 1);
    assert_eq!(*host.injected.lock().unwrap(), 0);
}

#[tokio::test]
async fn failed_delivery_injects_once_and_retries_once() {
    let host = Arc::new(FakeHost::new(vec![
        Err(HostError::NoAgent),
        Ok(AgentResponse::Selection { text: "Hello".to_string() }),
    ]));
    let bridge = AgentBridge::new(host.clone());

    let text = bridge.get_selection(TAB).await.unwrap();
    assert_eq!(text, "Hello");
    assert_eq!(*host.delivered.lock().unwrap(), 2);
    assert_eq!(*host.injected.lock().unwrap(), 1);
}

#[tokio::test]
async fn retry_failure_is_terminal() {
    let host = Arc::new(FakeHost::new(vec![
        Err(HostError::NoAgent),
        Err(HostError::NoAgent),
    ]));
    let bridge = AgentBridge::new(host.clone());

    let err = bridge.send(TAB, AgentRequest::HideLoading).await.unwrap_err();
    assert!(matches!(err, TranslateError::AgentUnreachable(_)));
    // Exactly one injection, exactly one retry.
    assert_eq!(*host.delivered.lock().unwrap(), 2);
    assert_eq!(*host.injected.lock().unwrap(), 1);
}

#[tokio::test]
async fn injection_refusal_skips_the_retry() {
    let host = Arc::new(FakeHost::refusing_injection(vec![Err(HostError::NoAgent)]));
    let bridge = AgentBridge::new(host.clone());

    let err = bridge.send(TAB, AgentRequest::ShowLoading).await.unwrap_err();
    assert!(matches!(err, TranslateError::AgentUnreachable(_)));
    assert_eq!(*host.delivered.lock().unwrap(), 1);
    assert_eq!(*host.injected.lock().unwrap(), 1);
}

#[tokio::test]
async fn selection_wrapper_rejects_a_mismatched_reply() {
    let host = Arc::new(FakeHost::new(vec![Ok(AgentResponse::Ack)]));
    let bridge = AgentBridge::new(host);

    let err = bridge.get_selection(TAB).await.unwrap_err();
    assert!(matches!(err, TranslateError::AgentUnreachable(_)));
}
