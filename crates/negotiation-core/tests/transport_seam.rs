//! Session setup and termination through the transport seam

use std::sync::Arc;

use async_trait::async_trait;
use callmedia_negotiation_core::{
    CallId, CallRole, CodecCatalog, FlowTable, LoggingTransport, MediaNegotiator, MediaTransport,
    NegotiationError, NegotiatorConfig, PortAllocator, Result,
};
use parking_lot::Mutex;

#[derive(Debug, Clone, PartialEq)]
enum TransportEvent {
    Setup { call_id: CallId, role: CallRole, flows: usize },
    Teardown { call_id: CallId, flows: usize },
}

/// Records every request instead of binding sockets
#[derive(Default)]
struct RecordingTransport {
    events: Mutex<Vec<TransportEvent>>,
    fail_teardown: bool,
}

#[async_trait]
impl MediaTransport for RecordingTransport {
    async fn setup_flows(&self, call_id: &CallId, role: CallRole, flows: &FlowTable) -> Result<()> {
        self.events.lock().push(TransportEvent::Setup {
            call_id: call_id.clone(),
            role,
            flows: flows.len(),
        });
        Ok(())
    }

    async fn teardown_flows(&self, call_id: &CallId, flows: &FlowTable) -> Result<()> {
        self.events.lock().push(TransportEvent::Teardown {
            call_id: call_id.clone(),
            flows: flows.len(),
        });
        if self.fail_teardown {
            return Err(NegotiationError::transport("socket already closed"));
        }
        Ok(())
    }
}

fn negotiator(transport: Arc<dyn MediaTransport>) -> MediaNegotiator {
    let config = NegotiatorConfig::from_toml_str("[logging]\nlevel = \"debug\"").unwrap();
    // Tests share one process; only the first install succeeds
    let _ = config.init_logging();

    MediaNegotiator::builder()
        .with_config(config)
        .with_port_allocator(Arc::new(PortAllocator::default()))
        .with_transport(transport)
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_setup_and_termination_reach_transport() {
    let transport = Arc::new(RecordingTransport::default());
    let alice = negotiator(transport.clone());
    let bob = negotiator(Arc::new(LoggingTransport));
    let call = CallId::from("call-1");

    let offer = alice.generate_offer(&call, "192.0.2.10").unwrap();
    let answer = bob
        .generate_answer(&call, &offer, "192.0.2.20")
        .unwrap()
        .into_answer()
        .unwrap();
    alice.receive_answer(&call, answer).unwrap();

    alice.perform_session_setup(&call).await.unwrap();
    bob.perform_session_setup(&call).await.unwrap();
    alice.perform_session_termination(&call).await.unwrap();
    bob.perform_session_termination(&call).await.unwrap();

    assert_eq!(
        *transport.events.lock(),
        vec![
            TransportEvent::Setup {
                call_id: call.clone(),
                role: CallRole::Caller,
                flows: 4
            },
            TransportEvent::Teardown {
                call_id: call.clone(),
                flows: 4
            },
        ]
    );
    assert_eq!(alice.active_calls(), 0);
    assert_eq!(alice.port_allocator().allocated_count(), 0);
}

#[tokio::test]
async fn test_empty_flow_table_is_not_an_error() {
    let transport = Arc::new(RecordingTransport::default());
    let bob = negotiator(transport.clone());
    let alice = MediaNegotiator::builder()
        .with_catalog(CodecCatalog::new(vec![callmedia_negotiation_core::Codec::new("PCMU", 0, 8000)]).unwrap())
        .with_port_allocator(Arc::new(PortAllocator::default()))
        .build()
        .unwrap();
    let call = CallId::from("no-common-codec");

    let offer = alice.generate_offer(&call, "192.0.2.10").unwrap();
    assert!(bob.generate_answer(&call, &offer, "192.0.2.20").unwrap().is_no_match());

    bob.perform_session_setup(&call).await.unwrap();
    assert_eq!(
        *transport.events.lock(),
        vec![TransportEvent::Setup {
            call_id: call.clone(),
            role: CallRole::Callee,
            flows: 0
        }]
    );
}

#[tokio::test]
async fn test_setup_for_unknown_call() {
    let alice = negotiator(Arc::new(LoggingTransport));
    let call = CallId::from("unknown");

    assert!(matches!(
        alice.perform_session_setup(&call).await,
        Err(NegotiationError::CallNotFound { .. })
    ));
    // Termination of an unknown call is a no-op
    assert!(alice.perform_session_termination(&call).await.is_ok());
}

#[tokio::test]
async fn test_failed_teardown_still_forgets_call() {
    let transport = Arc::new(RecordingTransport {
        fail_teardown: true,
        ..Default::default()
    });
    let alice = negotiator(transport);
    let call = CallId::from("call-1");
    alice.generate_offer(&call, "192.0.2.10").unwrap();

    assert!(matches!(
        alice.perform_session_termination(&call).await,
        Err(NegotiationError::Transport(_))
    ));
    assert_eq!(alice.active_calls(), 0);
    assert_eq!(alice.port_allocator().allocated_count(), 0);
}

#[tokio::test]
async fn test_logging_transport_accepts_flows() {
    let alice = negotiator(Arc::new(LoggingTransport));
    let bob = negotiator(Arc::new(LoggingTransport));
    let call = CallId::from("call-2");

    let offer = alice.generate_offer(&call, "192.0.2.10").unwrap();
    bob.generate_answer(&call, &offer, "192.0.2.20").unwrap();

    let flows = bob.flow_table(&call).unwrap();
    LoggingTransport
        .setup_flows(&call, CallRole::Callee, &flows)
        .await
        .unwrap();
    LoggingTransport.teardown_flows(&call, &flows).await.unwrap();
}
