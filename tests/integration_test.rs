use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use psbroker::BrokerContext;
use psbroker::config::Settings;
use psbroker::stats::{Reporter, Stats};
use psbroker::transport::Server;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::mpsc;
use tokio::time::timeout;

async fn start_server(max_connections: usize) -> (u16, Arc<BrokerContext>) {
    let settings = Settings::default().with_cli(max_connections, None);
    let server = Server::bind(&settings).await.expect("bind failed");
    let port = server.local_port().unwrap();
    let ctx = server.context();
    tokio::spawn(server.run());
    (port, ctx)
}

struct Peer {
    lines: Lines<BufReader<OwnedReadHalf>>,
    writer: OwnedWriteHalf,
}

impl Peer {
    async fn connect(port: u16) -> Self {
        let stream = TcpStream::connect(("127.0.0.1", port))
            .await
            .expect("Failed to connect");
        let (reader, writer) = stream.into_split();
        Self {
            lines: BufReader::new(reader).lines(),
            writer,
        }
    }

    async fn send(&mut self, line: &str) {
        self.writer
            .write_all(format!("{line}\n").as_bytes())
            .await
            .expect("Failed to send");
    }

    async fn recv(&mut self) -> String {
        timeout(Duration::from_secs(5), self.lines.next_line())
            .await
            .expect("timed out waiting for a line")
            .unwrap()
            .expect("server closed the connection")
    }

    async fn assert_silent(&mut self) {
        let next = timeout(Duration::from_millis(200), self.lines.next_line()).await;
        assert!(next.is_err(), "unexpected line: {next:?}");
    }
}

async fn wait_for_stats(ctx: &BrokerContext, pred: impl Fn(&Stats) -> bool) {
    for _ in 0..500 {
        if pred(&ctx.stats().snapshot()) {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("stats never matched: {:?}", ctx.stats().snapshot());
}

#[tokio::test]
async fn integration_pubsub_end_to_end() {
    let (port, ctx) = start_server(0).await;
    let mut alice = Peer::connect(port).await;
    let mut bob = Peer::connect(port).await;
    let mut carol = Peer::connect(port).await;

    bob.send("name bob").await;
    bob.send("sub test").await;
    carol.send("name carol").await;
    carol.send("sub other").await;
    wait_for_stats(&ctx, |s| s.sub_ops == 2).await;

    alice.send("name alice").await;
    alice.send("pub test hello world").await;

    assert_eq!(bob.recv().await, "alice:test:hello world");
    carol.assert_silent().await;
    alice.assert_silent().await;
}

#[tokio::test]
async fn topic_survives_last_unsubscribe() {
    let (port, ctx) = start_server(0).await;
    let mut alice = Peer::connect(port).await;
    let mut bob = Peer::connect(port).await;

    alice.send("name alice").await;
    alice.send("sub news").await;
    alice.send("unsub news").await;
    wait_for_stats(&ctx, |s| s.unsub_ops == 1).await;
    assert!(ctx.registry().lookup("news").is_some());

    bob.send("name bob").await;
    bob.send("sub news").await;
    wait_for_stats(&ctx, |s| s.sub_ops == 2).await;

    alice.send("pub news still here").await;
    assert_eq!(bob.recv().await, "alice:news:still here");
    alice.assert_silent().await;
}

#[tokio::test]
async fn duplicate_subscribe_delivers_once() {
    let (port, ctx) = start_server(0).await;
    let mut alice = Peer::connect(port).await;
    let mut bob = Peer::connect(port).await;

    bob.send("name bob").await;
    bob.send("sub news").await;
    bob.send("sub news").await;
    alice.send("name alice").await;
    // alice's subscription marks the point after both of bob's were handled.
    alice.send("sub news").await;
    wait_for_stats(&ctx, |s| s.sub_ops == 2).await;

    alice.send("pub news one").await;
    alice.send("pub news two").await;
    assert_eq!(bob.recv().await, "alice:news:one");
    assert_eq!(bob.recv().await, "alice:news:two");
    bob.assert_silent().await;
}

#[tokio::test]
async fn publish_to_unknown_topic_is_silent() {
    let (port, ctx) = start_server(0).await;
    let mut alice = Peer::connect(port).await;

    alice.send("name alice").await;
    alice.send("pub nowhere hello").await;
    alice.assert_silent().await;

    let stats = ctx.stats().snapshot();
    assert_eq!((stats.pub_ops, stats.sub_ops, stats.unsub_ops), (0, 0, 0));
    assert_eq!(ctx.registry().topic_count(), 0);
}

#[tokio::test]
async fn malformed_commands_get_one_invalid_each() {
    let (port, ctx) = start_server(0).await;
    let mut alice = Peer::connect(port).await;

    alice.send("name alice").await;
    for bad in ["pub news", "pub news ", "sub to:pic", "unsub", "dance"] {
        alice.send(bad).await;
    }
    for _ in 0..5 {
        assert_eq!(alice.recv().await, ":invalid");
    }
    alice.assert_silent().await;

    let stats = ctx.stats().snapshot();
    assert_eq!((stats.pub_ops, stats.sub_ops, stats.unsub_ops), (0, 0, 0));
    assert_eq!(ctx.registry().topic_count(), 0);
}

#[tokio::test]
async fn admission_limit_blocks_until_a_slot_frees() {
    let (port, ctx) = start_server(2).await;

    let mut alice = Peer::connect(port).await;
    alice.send("name alice").await;
    alice.send("sub news").await;
    let mut bob = Peer::connect(port).await;
    bob.send("name bob").await;
    bob.send("sub news").await;
    wait_for_stats(&ctx, |s| s.sub_ops == 2 && s.connected == 2).await;

    // carol's connection completes at the TCP level, but nothing she sends is
    // processed until she is admitted.
    let mut carol = Peer::connect(port).await;
    carol.send("name carol").await;
    carol.send("sub news").await;
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(ctx.stats().snapshot().connected, 2);
    assert_eq!(ctx.stats().snapshot().sub_ops, 2);

    alice.send("pub news hello").await;
    assert_eq!(bob.recv().await, "alice:news:hello");
    carol.assert_silent().await;

    drop(alice);
    wait_for_stats(&ctx, |s| s.completed == 1 && s.sub_ops == 3).await;
    assert_eq!(ctx.stats().snapshot().connected, 2);

    bob.send("pub news welcome").await;
    assert_eq!(carol.recv().await, "bob:news:welcome");
}

#[tokio::test]
async fn concurrent_clients_respect_admission_limit() {
    const CLIENTS: usize = 8;
    const LIMIT: usize = 3;

    let (port, ctx) = start_server(LIMIT).await;

    let peak = Arc::new(AtomicU64::new(0));
    let (stop_tx, mut stop_rx) = mpsc::unbounded_channel::<()>();
    let monitor = {
        let ctx = ctx.clone();
        let peak = peak.clone();
        tokio::spawn(async move {
            loop {
                peak.fetch_max(ctx.stats().snapshot().connected, Ordering::SeqCst);
                tokio::select! {
                    _ = stop_rx.recv() => break,
                    _ = tokio::time::sleep(Duration::from_millis(1)) => {}
                }
            }
        })
    };

    let clients = (0..CLIENTS).map(|i| async move {
        let mut peer = Peer::connect(port).await;
        peer.send(&format!("name c{i}")).await;
        peer.send(&format!("sub t{i}")).await;
        peer.send(&format!("pub t{i} hello")).await;
        let line = peer.recv().await;
        peer.send(&format!("unsub t{i}")).await;
        line
    });
    let lines = timeout(Duration::from_secs(20), futures::future::join_all(clients))
        .await
        .expect("clients did not all complete");

    for (i, line) in lines.iter().enumerate() {
        assert_eq!(line, &format!("c{i}:t{i}:hello"));
    }

    wait_for_stats(&ctx, |s| s.completed == CLIENTS as u64).await;
    stop_tx.send(()).unwrap();
    monitor.await.unwrap();

    assert!(peak.load(Ordering::SeqCst) <= LIMIT as u64);
    let stats = ctx.stats().snapshot();
    assert_eq!(stats.connected, 0);
    assert_eq!(stats.pub_ops, CLIENTS as u64);
    assert_eq!(stats.sub_ops, CLIENTS as u64);
    assert_eq!(ctx.registry().topic_count(), CLIENTS);
}

#[tokio::test]
async fn statistics_snapshot_format() {
    let (port, ctx) = start_server(0).await;
    let mut alice = Peer::connect(port).await;
    let mut bob = Peer::connect(port).await;

    alice.send("name alice").await;
    alice.send("sub news").await;
    bob.send("name bob").await;
    bob.send("sub news").await;
    bob.send("unsub news").await;
    wait_for_stats(&ctx, |s| s.sub_ops == 2 && s.unsub_ops == 1).await;
    for i in 0..3 {
        bob.send(&format!("pub news {i}")).await;
    }
    for i in 0..3 {
        assert_eq!(alice.recv().await, format!("bob:news:{i}"));
    }
    wait_for_stats(&ctx, |s| s.pub_ops == 3).await;

    let (trigger, rx) = mpsc::unbounded_channel::<()>();
    trigger.send(()).unwrap();
    drop(trigger);
    let out = Reporter::new(ctx.stats().clone(), Vec::new()).run(rx).await;

    assert_eq!(
        String::from_utf8(out).unwrap(),
        "Connected clients:2\n\
         Completed clients:0\n\
         pub operations:3\n\
         sub operations:2\n\
         unsub operations:1\n"
    );
}
