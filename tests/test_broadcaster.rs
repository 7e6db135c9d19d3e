use dex_order_engine::broadcaster::{SessionBroadcaster, SessionStream};
use dex_order_engine::events::OrderEvent;

#[test]
fn test_attach_to_unknown_order_returns_not_found() {
    let broadcaster = SessionBroadcaster::new();
    let stream = broadcaster.attach(&"does-not-exist".to_string());
    assert!(matches!(stream, SessionStream::NotFound));
}

#[test]
fn test_attach_after_terminal_event_returns_the_terminal_envelope_without_a_live_subscription() {
    let broadcaster = SessionBroadcaster::new();
    let channel = broadcaster.create("order-1".to_string());
    channel.emit(OrderEvent::Pending { message: "submitted".into() });
    channel.emit(OrderEvent::Failed { message: "boom".into(), error: "no_quotes".into() });

    match broadcaster.attach(&"order-1".to_string()) {
        SessionStream::Terminal(envelope) => {
            assert!(matches!(envelope.event, OrderEvent::Failed { .. }));
        }
        _ => panic!("expected Terminal, matched a different variant instead"),
    }
}

#[test]
fn test_attach_mid_flight_replays_everything_emitted_so_far_then_streams_live() {
    let broadcaster = SessionBroadcaster::new();
    let channel = broadcaster.create("order-2".to_string());
    channel.emit(OrderEvent::Pending { message: "submitted".into() });
    channel.emit(OrderEvent::QuoteFailed {
        dex: "orca".into(),
        error: "venue_transient".into(),
        quotes_received: 1,
        total_expected: 4,
    });

    let SessionStream::Live { replay, mut rx } = broadcaster.attach(&"order-2".to_string()) else {
        panic!("expected Live since the order hasn't reached a terminal state yet");
    };
    assert_eq!(replay.len(), 2);
    assert!(matches!(replay[0].event, OrderEvent::Pending { .. }));
    assert!(matches!(replay[1].event, OrderEvent::QuoteFailed { .. }));

    channel.emit(OrderEvent::Confirmed {
        dex: "jupiter".into(),
        tx_hash: "0xabc".into(),
        amount_out: 99.5,
        executed_price: 1.01,
    });

    let live = rx.try_recv().expect("the confirmed event emitted after attach should be on the live channel");
    assert!(matches!(live.event, OrderEvent::Confirmed { .. }));
}

#[test]
fn test_get_returns_none_once_a_channel_has_been_removed() {
    let broadcaster = SessionBroadcaster::new();
    broadcaster.create("order-3".to_string());
    assert!(broadcaster.get(&"order-3".to_string()).is_some());

    broadcaster.remove(&"order-3".to_string());
    assert!(broadcaster.get(&"order-3".to_string()).is_none());
    assert!(matches!(broadcaster.attach(&"order-3".to_string()), SessionStream::NotFound));
}

#[test]
fn test_last_reflects_the_most_recently_emitted_envelope() {
    let channel = dex_order_engine::broadcaster::OrderChannel::new("order-4".to_string());
    assert!(channel.last().is_none());

    channel.emit(OrderEvent::Pending { message: "submitted".into() });
    let last = channel.last().unwrap();
    assert!(matches!(last.event, OrderEvent::Pending { .. }));

    channel.emit(OrderEvent::Building { dex: "orca".into(), stage: "building".into() });
    let last = channel.last().unwrap();
    assert!(matches!(last.event, OrderEvent::Building { .. }));
}
