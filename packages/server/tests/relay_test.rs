//! End-to-end tests: a relay served on an ephemeral port, driven by real
//! WebSocket clients.

use std::{sync::Arc, time::Duration};

use futures_util::{SinkExt, StreamExt};
use relay_server::{
    domain::{ConnectionId, Envelope, UuidConnectionIdFactory},
    hub::{Hub, HubHandle},
    ui::{AppState, serve},
};
use tokio::{
    net::{TcpListener, TcpStream},
    sync::mpsc,
};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

const TIMEOUT: Duration = Duration::from_secs(5);
/// How long a client must stay silent to count as having nothing queued
const QUIET: Duration = Duration::from_millis(300);

/// Relay running in the background of the current test runtime
struct TestServer {
    addr: String,
    hub: HubHandle,
}

impl TestServer {
    async fn start(outbound_capacity: usize) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().unwrap().to_string();
        let hub = Hub::spawn(64);
        let state = AppState {
            hub: hub.clone(),
            ids: Arc::new(UuidConnectionIdFactory),
            outbound_capacity,
            close_grace: Duration::from_millis(200),
        };

        tokio::spawn(serve(listener, state, std::future::pending()));

        TestServer { addr, hub }
    }

    fn ws_url(&self) -> String {
        format!("ws://{}/ws", self.addr)
    }

    fn http_url(&self) -> String {
        format!("http://{}/ws", self.addr)
    }

    async fn members(&self) -> Vec<ConnectionId> {
        self.hub.members().await.expect("Hub should be running")
    }

    /// Poll the hub until it has exactly `count` members.
    async fn wait_for_members(&self, count: usize) -> Vec<ConnectionId> {
        tokio::time::timeout(TIMEOUT, async {
            loop {
                let members = self.members().await;
                if members.len() == count {
                    return members;
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap_or_else(|_| panic!("Hub never reached {} members", count))
    }

    /// Connect a client and wait until the hub has registered it.
    async fn join(&self) -> (Client, ConnectionId) {
        let before = self.members().await;
        let (client, _response) = connect_async(self.ws_url())
            .await
            .expect("Failed to connect");
        let after = self.wait_for_members(before.len() + 1).await;
        let id = after
            .into_iter()
            .find(|id| !before.contains(id))
            .expect("New member should be registered");
        (client, id)
    }
}

/// Next text frame from the relay, decoded.
async fn next_envelope(client: &mut Client) -> Envelope {
    loop {
        let message = tokio::time::timeout(TIMEOUT, client.next())
            .await
            .expect("Timed out waiting for a message")
            .expect("Stream ended")
            .expect("Read failed");
        match message {
            Message::Text(text) => return Envelope::from_frame(text.as_str()).unwrap(),
            Message::Ping(_) | Message::Pong(_) => continue,
            other => panic!("Unexpected message: {:?}", other),
        }
    }
}

/// Assert that no frame arrives for a while.
async fn assert_nothing_queued(client: &mut Client) {
    let next = tokio::time::timeout(QUIET, client.next()).await;
    assert!(next.is_err(), "Unexpected frame: {:?}", next);
}

/// Forward every envelope `client` receives to a channel, reading as fast as
/// frames arrive.
fn spawn_reader(mut client: Client) -> mpsc::UnboundedReceiver<Envelope> {
    let (received_tx, received) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        while let Some(Ok(message)) = client.next().await {
            if let Message::Text(text) = message {
                let envelope = Envelope::from_frame(text.as_str()).unwrap();
                if received_tx.send(envelope).is_err() {
                    break;
                }
            }
        }
    });
    received
}

/// Have `sender` send large messages, in lockstep with `reader`, until the
/// hub drops `stalled`. Returns whether that happened.
async fn flood_until_evicted(
    server: &TestServer,
    sender: &mut Client,
    sender_id: ConnectionId,
    reader: &mut mpsc::UnboundedReceiver<Envelope>,
    stalled: ConnectionId,
) -> bool {
    let payload = "x".repeat(256 * 1024);
    let sender_id = sender_id.to_string();
    for _ in 0..400 {
        send_text(sender, &payload).await;
        // lockstep so the reader itself never falls behind
        loop {
            let envelope = tokio::time::timeout(TIMEOUT, reader.recv())
                .await
                .expect("Reader should keep receiving while the other client is stalled")
                .expect("Reader stopped");
            if envelope.sender.as_deref() == Some(sender_id.as_str()) {
                break;
            }
        }
        if !server.members().await.contains(&stalled) {
            return true;
        }
    }
    false
}

/// Wait on `reader` until `content` arrives, collecting what came before it.
async fn receive_until(
    reader: &mut mpsc::UnboundedReceiver<Envelope>,
    content: &str,
) -> Vec<Envelope> {
    tokio::time::timeout(TIMEOUT, async {
        let mut before = Vec::new();
        while let Some(envelope) = reader.recv().await {
            if envelope.content.as_deref() == Some(content) {
                return before;
            }
            before.push(envelope);
        }
        panic!("Reader stopped before {:?} arrived", content);
    })
    .await
    .unwrap_or_else(|_| panic!("{:?} should arrive in bounded time", content))
}

async fn send_text(client: &mut Client, text: &str) {
    client
        .send(Message::text(text))
        .await
        .expect("Failed to send message");
}

#[tokio::test]
async fn test_plain_http_request_gets_not_found() {
    // テスト項目: アップグレードを伴わない HTTP リクエストには 404 が返り、接続は作られない
    // given (前提条件):
    let server = TestServer::start(16).await;

    // when (操作):
    let response = reqwest::get(server.http_url())
        .await
        .expect("Request should complete");

    // then (期待する結果):
    assert_eq!(response.status(), reqwest::StatusCode::NOT_FOUND);
    assert!(server.members().await.is_empty());
}

#[tokio::test]
async fn test_join_notice_goes_to_earlier_members_only() {
    // テスト項目: 後から参加した接続の参加通知は先に参加した接続にのみ届く
    // given (前提条件):
    let server = TestServer::start(16).await;
    let (mut a, a_id) = server.join().await;

    // when (操作):
    let (mut b, b_id) = server.join().await;

    // then (期待する結果):
    assert_eq!(next_envelope(&mut a).await, Envelope::joined());
    // b's first frame is a's message, not its own join notice
    send_text(&mut a, "first").await;
    assert_eq!(
        next_envelope(&mut b).await,
        Envelope::message(a_id, "first")
    );
    assert_ne!(a_id, b_id);
}

#[tokio::test]
async fn test_broadcast_and_abrupt_disconnect_scenario() {
    // テスト項目: A, B, C の順に参加し、A の送信が B と C にのみ届き、
    //             B の突然の切断後は A と C に一度だけ退出通知が届く
    // given (前提条件):
    let server = TestServer::start(16).await;
    let (mut a, a_id) = server.join().await;
    let (mut b, b_id) = server.join().await;
    let (mut c, c_id) = server.join().await;
    assert_eq!(next_envelope(&mut a).await, Envelope::joined());
    assert_eq!(next_envelope(&mut a).await, Envelope::joined());
    assert_eq!(next_envelope(&mut b).await, Envelope::joined());

    // when (操作): A が "hello" を送信
    send_text(&mut a, "hello").await;

    // then (期待する結果): B と C が A からの "hello" を一度ずつ受信
    let hello = Envelope::message(a_id, "hello");
    assert_eq!(next_envelope(&mut b).await, hello);
    assert_eq!(next_envelope(&mut c).await, hello);

    // when (操作): B がクローズハンドシェイクなしで切断
    drop(b);

    // then (期待する結果): A と C が退出通知を一度だけ受信し、B はメンバーから外れる
    assert_eq!(next_envelope(&mut a).await, Envelope::left());
    assert_eq!(next_envelope(&mut c).await, Envelope::left());
    let members = server.wait_for_members(2).await;
    assert!(!members.contains(&b_id));
    assert_nothing_queued(&mut a).await;
    assert_nothing_queued(&mut c).await;

    // when (操作): C が送信
    send_text(&mut c, "bye").await;

    // then (期待する結果): A にだけ届き、C 自身には返らない
    assert_eq!(next_envelope(&mut a).await, Envelope::message(c_id, "bye"));
    assert_nothing_queued(&mut c).await;
}

#[tokio::test]
async fn test_clean_close_announces_left_and_ends_stream() {
    // テスト項目: クローズフレームで切断した接続には以降テキストが届かず、他の接続に退出通知が届く
    // given (前提条件):
    let server = TestServer::start(16).await;
    let (mut a, _a_id) = server.join().await;
    let (mut b, _b_id) = server.join().await;
    assert_eq!(next_envelope(&mut a).await, Envelope::joined());

    // when (操作):
    b.close(None).await.expect("Failed to send close frame");

    // then (期待する結果):
    assert_eq!(next_envelope(&mut a).await, Envelope::left());
    server.wait_for_members(1).await;
    let rest = tokio::time::timeout(TIMEOUT, async {
        let mut texts = 0;
        while let Some(Ok(message)) = b.next().await {
            if message.is_text() {
                texts += 1;
            }
        }
        texts
    })
    .await
    .expect("Closed connection should end its stream");
    assert_eq!(rest, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_slow_consumer_is_dropped_without_stalling_others() {
    // テスト項目: 受信しない接続 B のキューが溢れると B は切り離され、C への配信は止まらない
    // given (前提条件):
    let server = TestServer::start(16).await;
    let (mut a, a_id) = server.join().await;
    let (_b, b_id) = server.join().await;
    let (c, _c_id) = server.join().await;
    let mut received = spawn_reader(c);

    // when (操作): B が読まないまま A が大きなメッセージを送り続ける
    let evicted = flood_until_evicted(&server, &mut a, a_id, &mut received, b_id).await;

    // then (期待する結果): B は切り離され、A の次のメッセージも C に届く
    assert!(evicted, "Stalled connection should have been dropped");
    send_text(&mut a, "marker").await;
    receive_until(&mut received, "marker").await;
    assert_eq!(server.members().await.len(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_evicted_connection_is_closed_and_cannot_broadcast() {
    // テスト項目: 遅い接続として切り離された B の送信は C に届かず、B の接続はサーバー側から閉じられる
    // given (前提条件):
    let server = TestServer::start(8).await;
    let (mut a, a_id) = server.join().await;
    let (mut b, b_id) = server.join().await;
    let (c, _c_id) = server.join().await;
    let mut received = spawn_reader(c);
    let evicted = flood_until_evicted(&server, &mut a, a_id, &mut received, b_id).await;
    assert!(evicted, "Stalled connection should have been dropped");

    // when (操作): 切り離された B が送信し、その後 A が目印を送る
    let _ = b.send(Message::text("ghost")).await;
    tokio::time::sleep(QUIET).await;
    send_text(&mut a, "marker").await;

    // then (期待する結果): C には B からのメッセージが届かない
    let b_sender = b_id.to_string();
    let before_marker = receive_until(&mut received, "marker").await;
    assert!(
        before_marker
            .iter()
            .all(|envelope| envelope.sender.as_deref() != Some(b_sender.as_str())),
        "Evicted connection's message was relayed: {:?}",
        before_marker
    );

    // B の接続は読み残しを読み切ると終了する
    tokio::time::timeout(TIMEOUT * 2, async {
        while let Some(Ok(_)) = b.next().await {}
    })
    .await
    .expect("Server should close the evicted connection");
    assert_eq!(server.members().await.len(), 2);
}
