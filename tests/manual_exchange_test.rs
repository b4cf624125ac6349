//! Manual Copy-Paste Exchange Integration Tests

use parley::application::{ManualExchangeCall, ManualPeer};
use parley::domain::negotiation::observer::NegotiationObserver;
use parley::domain::negotiation::value_object::{
    ConnectivityState, EndpointRole, MediaConstraints, SignalingState,
};
use parley::infrastructure::media::SyntheticCamera;
use parley::infrastructure::signaling::copy_paste::{dearmor, ExchangeBundle};
use parley::NegotiationError;
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct CollectingObserver {
    errors: Mutex<Vec<NegotiationError>>,
}

impl NegotiationObserver for CollectingObserver {
    fn on_event(&self, _event: &parley::domain::negotiation::event::NegotiationEvent) {}

    fn on_error(&self, error: &NegotiationError) {
        self.errors.lock().unwrap().push(error.clone());
    }
}

fn stun_servers() -> Vec<String> {
    vec!["stun:stun1.l.google.com:19302".to_string()]
}

async fn peer(observer: Arc<dyn NegotiationObserver>) -> ManualPeer {
    ManualPeer::new(
        observer,
        Arc::new(SyntheticCamera::new()),
        MediaConstraints::video_only(),
        stun_servers(),
    )
    .await
}

#[tokio::test]
async fn test_manual_exchange_negotiates_both_sides() {
    let observer = Arc::new(CollectingObserver::default());
    let exchange = ManualExchangeCall::new(
        peer(observer.clone()).await,
        peer(observer.clone()).await,
    );

    let session_id = exchange.run().await.unwrap();

    let caller = exchange.caller().coordinator().session(session_id).await.unwrap();
    let callee = exchange.callee().coordinator().session(session_id).await.unwrap();

    // The answer travels back verbatim
    assert_eq!(
        caller.endpoint(EndpointRole::Local).remote_description(),
        callee.endpoint(EndpointRole::Remote).local_description(),
    );
    // And the offer traveled out verbatim
    assert_eq!(
        callee.endpoint(EndpointRole::Remote).remote_description(),
        caller.endpoint(EndpointRole::Local).local_description(),
    );

    // Each side's own endpoint reaches connected on the simulated transport
    assert_eq!(
        caller.endpoint(EndpointRole::Local).connectivity_state(),
        ConnectivityState::Connected
    );
    assert_eq!(
        callee.endpoint(EndpointRole::Remote).connectivity_state(),
        ConnectivityState::Connected
    );
    assert!(observer.errors.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_candidates_pasted_out_of_order_are_tolerated() {
    let observer = Arc::new(CollectingObserver::default());
    let caller = peer(observer.clone()).await;
    let callee = peer(observer.clone()).await;

    caller.start_call().await.unwrap();
    let mut outbox = caller.outbox();

    // Keep the offer first, then reverse the candidate traffic behind it,
    // putting the end-of-gathering sentinel ahead of the candidates
    let offer_text = outbox.remove(0);
    outbox.reverse();

    callee.paste(&offer_text).await.unwrap();
    for text in &outbox {
        callee.paste(text).await.unwrap();
    }

    let session_id = dearmor(&offer_text).unwrap().session_id();
    let callee_session = callee.coordinator().session(session_id).await.unwrap();

    // Every candidate still landed
    assert_eq!(
        callee_session
            .endpoint(EndpointRole::Remote)
            .remote_candidates()
            .len(),
        2
    );
    assert_eq!(
        callee_session.endpoint(EndpointRole::Remote).signaling_state(),
        SignalingState::Stable
    );
    assert!(observer.errors.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_tampered_paste_is_rejected_without_aborting() {
    let observer = Arc::new(CollectingObserver::default());
    let caller = peer(observer.clone()).await;
    let callee = peer(observer.clone()).await;

    caller.start_call().await.unwrap();
    let outbox = caller.outbox();

    assert!(matches!(
        callee.paste("this was mangled in transit").await,
        Err(NegotiationError::MalformedDescription(_))
    ));

    // The untampered offer still goes through afterwards
    callee.paste(&outbox[0]).await.unwrap();
    let session_id = dearmor(&outbox[0]).unwrap().session_id();
    assert!(callee.coordinator().has_session(session_id).await);
}

#[tokio::test]
async fn test_bundle_paste_delivers_description_and_candidates() {
    let observer = Arc::new(CollectingObserver::default());
    let caller = peer(observer.clone()).await;
    let callee = peer(observer.clone()).await;

    caller.start_call().await.unwrap();

    // Fold the whole outbox into one pasteable blob
    let messages = caller
        .outbox()
        .iter()
        .map(|text| dearmor(text).unwrap())
        .collect::<Vec<_>>();
    let session_id = messages[0].session_id();
    let bundle = ExchangeBundle::new(messages);

    // One paste carries the offer and every candidate gathered so far
    callee.paste_bundle(&bundle.armor()).await.unwrap();

    let session = callee.coordinator().session(session_id).await.unwrap();
    assert!(session
        .endpoint(EndpointRole::Remote)
        .local_description()
        .is_some());
    assert_eq!(
        session
            .endpoint(EndpointRole::Remote)
            .remote_candidates()
            .len(),
        2
    );
}
