use super::*;
use crate::state::test_helpers::{
    assert_no_message, black, recv_message, register_client, test_app_state, test_app_state_excluding_sender,
};
use frames::{CODE_INVALID_MESSAGE, encode_client_binary, encode_client_text};

fn text(raw: &str) -> Inbound {
    Inbound::Text(raw.to_owned())
}

fn append_text(pixels: Vec<Pixel>) -> Inbound {
    Inbound::Text(encode_client_text(&ClientMessage::AppendPixels(pixels)))
}

fn assert_invalid(replies: &[ServerMessage]) {
    assert_eq!(replies.len(), 1, "expected exactly one reply, got {replies:?}");
    match &replies[0] {
        ServerMessage::Error { code, .. } => assert_eq!(code, CODE_INVALID_MESSAGE),
        other => panic!("expected ERROR, got {other:?}"),
    }
}

// =============================================================================
// HANDLER TABLE
// =============================================================================

#[test]
fn append_dispatches_to_broadcast() {
    let pixels = vec![black(1.0, 2.0)];
    assert_eq!(
        dispatch(ClientMessage::AppendPixels(pixels.clone())),
        Outcome::Broadcast(Mutation::Append(pixels))
    );
}

#[test]
fn clear_dispatches_to_broadcast() {
    assert_eq!(dispatch(ClientMessage::Clear), Outcome::Broadcast(Mutation::Clear));
}

#[test]
fn empty_batch_dispatches_to_nothing() {
    assert_eq!(dispatch(ClientMessage::AppendPixels(vec![])), Outcome::Done);
}

#[test]
fn session_starts_connecting_and_tracks_transitions() {
    let mut session = Session::new(Encoding::Binary);
    assert_eq!(session.phase, Phase::Connecting);
    for next in [Phase::Synced, Phase::AwaitingMessage, Phase::Applying, Phase::AwaitingMessage, Phase::Closed] {
        session.transition(next);
        assert_eq!(session.phase, next);
    }
}

// =============================================================================
// INBOUND PROCESSING
// =============================================================================

#[tokio::test]
async fn append_reaches_every_client_and_store() {
    let state = test_app_state();
    let (sender, mut sender_rx) = register_client(&state, 8).await;
    let (_peer, mut peer_rx) = register_client(&state, 8).await;

    let replies = process_inbound(&state, sender, &append_text(vec![black(1.0, 1.0)])).await;

    assert!(replies.is_empty());
    assert_eq!(recv_message(&mut sender_rx).await, ServerMessage::NewPixels(vec![black(1.0, 1.0)]));
    assert_eq!(recv_message(&mut peer_rx).await, ServerMessage::NewPixels(vec![black(1.0, 1.0)]));
    assert_eq!(services::canvas::snapshot(&state).await, vec![black(1.0, 1.0)]);
}

#[tokio::test]
async fn legacy_click_without_drag_is_ignored() {
    let state = test_app_state();
    let (sender, mut sender_rx) = register_client(&state, 8).await;
    let (_peer, mut peer_rx) = register_client(&state, 8).await;

    let raw = r#"{"type":"CREATE_PIXELS_ARRAY","pixelsArray":[]}"#;
    let replies = process_inbound(&state, sender, &text(raw)).await;

    assert!(replies.is_empty(), "unexpected replies: {replies:?}");
    assert!(services::canvas::snapshot(&state).await.is_empty());
    assert_no_message(&mut sender_rx).await;
    assert_no_message(&mut peer_rx).await;
}

#[tokio::test]
async fn canonical_empty_append_is_still_rejected() {
    let state = test_app_state();
    let (sender, mut sender_rx) = register_client(&state, 8).await;

    let replies = process_inbound(&state, sender, &text(r#"{"type":"APPEND_PIXELS","payload":[]}"#)).await;

    assert_invalid(&replies);
    assert_no_message(&mut sender_rx).await;
}

#[tokio::test]
async fn missing_color_errors_sender_only() {
    let state = test_app_state();
    let (sender, mut sender_rx) = register_client(&state, 8).await;
    let (_peer, mut peer_rx) = register_client(&state, 8).await;

    let raw = r#"{"type":"APPEND_PIXELS","payload":[{"x":1,"y":2}]}"#;
    let replies = process_inbound(&state, sender, &text(raw)).await;

    assert_invalid(&replies);
    assert!(services::canvas::snapshot(&state).await.is_empty());
    assert_no_message(&mut sender_rx).await;
    assert_no_message(&mut peer_rx).await;
}

#[tokio::test]
async fn malformed_json_errors_and_connection_stays_usable() {
    let state = test_app_state();
    let (sender, mut sender_rx) = register_client(&state, 8).await;

    assert_invalid(&process_inbound(&state, sender, &text("{not json")).await);
    assert_invalid(&process_inbound(&state, sender, &text(r#"{"type":"PAINT_IT_BLACK"}"#)).await);

    let replies = process_inbound(&state, sender, &append_text(vec![black(3.0, 3.0)])).await;
    assert!(replies.is_empty());
    assert_eq!(recv_message(&mut sender_rx).await, ServerMessage::NewPixels(vec![black(3.0, 3.0)]));
}

#[tokio::test]
async fn clear_broadcasts_and_empties_store() {
    let state = test_app_state();
    let (sender, mut sender_rx) = register_client(&state, 8).await;

    process_inbound(&state, sender, &append_text(vec![black(1.0, 1.0)])).await;
    let replies = process_inbound(&state, sender, &text(r#"{"type":"CLEAR","v":1}"#)).await;

    assert!(replies.is_empty());
    assert_eq!(recv_message(&mut sender_rx).await, ServerMessage::NewPixels(vec![black(1.0, 1.0)]));
    assert_eq!(recv_message(&mut sender_rx).await, ServerMessage::Clear);
    assert!(services::canvas::snapshot(&state).await.is_empty());
}

#[tokio::test]
async fn legacy_draw_pixel_is_appended() {
    let state = test_app_state();
    let (sender, mut sender_rx) = register_client(&state, 8).await;

    let raw = r#"{"type":"DRAW_PIXEL","payload":{"x":5,"y":6,"color":"red","sizeCircle":4}}"#;
    let replies = process_inbound(&state, sender, &text(raw)).await;

    assert!(replies.is_empty());
    let expected = vec![Pixel::new(5.0, 6.0, "red").with_radius(4.0)];
    assert_eq!(recv_message(&mut sender_rx).await, ServerMessage::NewPixels(expected.clone()));
    assert_eq!(services::canvas::snapshot(&state).await, expected);
}

#[tokio::test]
async fn binary_frames_are_dispatched() {
    let state = test_app_state();
    let (sender, mut sender_rx) = register_client(&state, 8).await;

    let bytes = encode_client_binary(&ClientMessage::AppendPixels(vec![black(7.0, 8.0)]));
    let replies = process_inbound(&state, sender, &Inbound::Binary(bytes)).await;

    assert!(replies.is_empty());
    assert_eq!(recv_message(&mut sender_rx).await, ServerMessage::NewPixels(vec![black(7.0, 8.0)]));
}

#[tokio::test]
async fn garbage_binary_is_rejected() {
    let state = test_app_state();
    let (sender, mut sender_rx) = register_client(&state, 8).await;

    let replies = process_inbound(&state, sender, &Inbound::Binary(vec![0xff, 0xff, 0xff])).await;

    assert_invalid(&replies);
    assert_no_message(&mut sender_rx).await;
}

#[tokio::test]
async fn excluded_sender_still_mutates_store() {
    let state = test_app_state_excluding_sender();
    let (sender, mut sender_rx) = register_client(&state, 8).await;
    let (_peer, mut peer_rx) = register_client(&state, 8).await;

    process_inbound(&state, sender, &append_text(vec![black(1.0, 1.0)])).await;

    assert_eq!(recv_message(&mut peer_rx).await, ServerMessage::NewPixels(vec![black(1.0, 1.0)]));
    assert_no_message(&mut sender_rx).await;
    assert_eq!(services::canvas::snapshot(&state).await.len(), 1);
}

// =============================================================================
// SCENARIOS
// =============================================================================

/// Empty canvas, A joins, B joins, A draws one pixel.
#[tokio::test]
async fn scenario_two_clients_one_pixel() {
    let state = test_app_state();
    let (tx_a, mut rx_a) = mpsc::channel(8);
    let (tx_b, mut rx_b) = mpsc::channel(8);
    let a = Uuid::new_v4();
    services::canvas::join(&state, a, tx_a).await.expect("join a");
    services::canvas::join(&state, Uuid::new_v4(), tx_b).await.expect("join b");

    let pixel = Pixel::new(1.0, 2.0, "#000").with_radius(3.0);
    process_inbound(&state, a, &append_text(vec![pixel.clone()])).await;

    for rx in [&mut rx_a, &mut rx_b] {
        assert_eq!(recv_message(rx).await, ServerMessage::Init(vec![]));
        assert_eq!(recv_message(rx).await, ServerMessage::NewPixels(vec![pixel.clone()]));
    }
    assert_eq!(services::canvas::snapshot(&state).await, vec![pixel]);
}

/// A late joiner receives everything drawn so far in one INIT.
#[tokio::test]
async fn scenario_late_joiner_gets_history() {
    let state = test_app_state();
    let (a, _rx_a) = register_client(&state, 8).await;
    process_inbound(&state, a, &append_text(vec![black(1.0, 1.0)])).await;
    process_inbound(&state, a, &append_text(vec![black(2.0, 2.0), black(3.0, 3.0)])).await;

    let (tx_c, mut rx_c) = mpsc::channel(8);
    services::canvas::join(&state, Uuid::new_v4(), tx_c).await.expect("join c");

    assert_eq!(
        recv_message(&mut rx_c).await,
        ServerMessage::Init(vec![black(1.0, 1.0), black(2.0, 2.0), black(3.0, 3.0)])
    );
    assert_no_message(&mut rx_c).await;
}

/// Invalid input from one client leaves everyone else undisturbed.
#[tokio::test]
async fn scenario_bad_client_does_not_affect_peers() {
    let state = test_app_state();
    let (bad, _bad_rx) = register_client(&state, 8).await;
    let (good, mut good_rx) = register_client(&state, 8).await;

    assert_invalid(&process_inbound(&state, bad, &text(r#"{"type":"APPEND_PIXELS","payload":[]}"#)).await);
    process_inbound(&state, good, &append_text(vec![black(9.0, 9.0)])).await;

    assert_eq!(recv_message(&mut good_rx).await, ServerMessage::NewPixels(vec![black(9.0, 9.0)]));
    assert_eq!(services::canvas::snapshot(&state).await, vec![black(9.0, 9.0)]);
}

// =============================================================================
// OUTBOUND ENCODING
// =============================================================================

#[test]
fn json_connections_get_text_frames() {
    match encode_outbound(Encoding::Json, &ServerMessage::Clear) {
        Message::Text(text) => {
            assert_eq!(frames::decode_server_text(text.as_str()).expect("decode"), ServerMessage::Clear);
        }
        other => panic!("expected text frame, got {other:?}"),
    }
}

#[test]
fn binary_connections_get_binary_frames() {
    let message = ServerMessage::NewPixels(vec![black(1.0, 1.0)]);
    match encode_outbound(Encoding::Binary, &message) {
        Message::Binary(bytes) => {
            assert_eq!(frames::decode_server_binary(&bytes).expect("decode"), message);
        }
        other => panic!("expected binary frame, got {other:?}"),
    }
}
