//! Relay end-to-end: a WebSocket subscriber sees every tap

use std::time::Duration;

use card_bridge::{CardBridge, TapOutcome, decode_frame};
use futures::StreamExt;
use gym_server::DbService;
use shared::relay::CardUid;
use tokio_tungstenite::connect_async;

async fn wait_for_subscribers(bridge: &CardBridge, n: usize) {
    for _ in 0..100 {
        if bridge.hub().subscriber_count() >= n {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("subscribers never connected");
}

async fn next_text<S>(ws: &mut S) -> String
where
    S: StreamExt<Item = Result<tokio_tungstenite::tungstenite::Message, tokio_tungstenite::tungstenite::Error>>
        + Unpin,
{
    loop {
        let msg = tokio::time::timeout(Duration::from_secs(5), ws.next())
            .await
            .expect("timed out waiting for frame")
            .expect("stream ended")
            .expect("websocket error");
        if msg.is_text() {
            return msg.to_text().unwrap().to_string();
        }
    }
}

#[tokio::test]
async fn subscribers_receive_every_uid() {
    let pool = DbService::in_memory().await.unwrap().pool;
    let mut bridge = CardBridge::with_pool(pool, "127.0.0.1:0".parse().unwrap(), None)
        .await
        .unwrap();
    let url = format!("ws://{}/", bridge.relay_addr());

    let (mut page, _) = connect_async(&url).await.unwrap();
    let (mut form, _) = connect_async(&url).await.unwrap();
    wait_for_subscribers(&bridge, 2).await;

    // nobody holds this card: still relayed so the intake form can use it
    let outcome = bridge.handle_tap(CardUid::new("04a2b3c4").unwrap()).await;
    assert_eq!(outcome, TapOutcome::UnknownCard);

    for ws in [&mut page, &mut form] {
        let text = next_text(ws).await;
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["kind"], "card_tap");
        assert_eq!(value["uid"], "04A2B3C4");
        let tap = decode_frame(&text).unwrap();
        assert_eq!(tap.uid.as_str(), "04A2B3C4");
    }

    drop(form);
    bridge.handle_tap(CardUid::new("0badcafe").unwrap()).await;
    let tap = decode_frame(&next_text(&mut page).await).unwrap();
    assert_eq!(tap.uid.as_str(), "0BADCAFE");

    bridge.shutdown().await;
}

#[tokio::test]
async fn relay_health_endpoint() {
    let pool = DbService::in_memory().await.unwrap().pool;
    let bridge = CardBridge::with_pool(pool, "127.0.0.1:0".parse().unwrap(), None)
        .await
        .unwrap();
    let addr = bridge.relay_addr();

    let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    stream
        .write_all(b"GET /health HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
        .await
        .unwrap();
    let mut response = String::new();
    stream.read_to_string(&mut response).await.unwrap();
    assert!(response.starts_with("HTTP/1.1 200"));
    assert!(response.contains("\"status\":\"ok\""));

    bridge.shutdown().await;
}
