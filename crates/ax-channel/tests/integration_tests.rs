//! Integration tests for the RF channel simulator
//!
//! These tests run the real TCP front-end against loopback connections and
//! verify end-to-end behavior: broadcast fan-out, sender exclusion,
//! propagation timing, counter updates, and cleanup on disconnect.

use std::sync::Arc;
use std::time::{Duration, Instant};

use ax_channel::{ChannelConfig, ChannelEvent, ChannelServer, RfChannel, StationHandle};
use ax_protocol::ax25::build_ui_frame;
use ax_protocol::{kiss, Ax25Address, Ax25Frame, KissDecoder};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::time::timeout;

mod helpers {
    use super::*;

    pub struct TestChannel {
        pub channel: Arc<RfChannel>,
        pub addrs: Vec<std::net::SocketAddr>,
        pub events: mpsc::Receiver<ChannelEvent>,
    }

    /// Start a server on ephemeral ports and return its channel and addresses
    pub async fn start(port_count: usize, config: ChannelConfig) -> TestChannel {
        let config = ChannelConfig {
            ports: vec![0; port_count],
            ..config
        };
        let (event_tx, events) = mpsc::channel(1024);
        let channel = Arc::new(RfChannel::new(config.clone(), event_tx));
        let server = ChannelServer::bind(&config, Arc::clone(&channel))
            .await
            .expect("bind");
        let addrs = server.local_addrs().expect("local addrs");
        let addrs = addrs
            .into_iter()
            .map(|a| std::net::SocketAddr::from(([127, 0, 0, 1], a.port())))
            .collect();
        tokio::spawn(server.run());
        TestChannel {
            channel,
            addrs,
            events,
        }
    }

    /// Connect a station and wait until the registry reflects it
    pub async fn connect(tc: &TestChannel, port_index: usize) -> TcpStream {
        let before = tc.channel.stations().len();
        let stream = TcpStream::connect(tc.addrs[port_index]).await.expect("connect");
        wait_for(|| tc.channel.stations().len() == before + 1).await;
        stream
    }

    /// Poll a condition with a deadline
    pub async fn wait_for(mut condition: impl FnMut() -> bool) {
        let deadline = Instant::now() + Duration::from_secs(2);
        while !condition() {
            assert!(Instant::now() < deadline, "condition not met in time");
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    /// KISS-framed UI frame ready to write to a socket
    pub fn wire_ui(src: &str, dst: &str, payload: &[u8]) -> Vec<u8> {
        let src: Ax25Address = src.parse().unwrap();
        let dst: Ax25Address = dst.parse().unwrap();
        let mut frame = vec![kiss::TYPE_DATA];
        frame.extend_from_slice(&build_ui_frame(&src, &dst, &[], payload));
        kiss::encode(&frame)
    }

    /// Read complete KISS frames from a socket until `quiet` passes with no
    /// further data
    pub async fn read_frames(stream: &mut TcpStream, quiet: Duration) -> Vec<Vec<u8>> {
        let mut decoder = KissDecoder::new();
        let mut buf = [0u8; 4096];
        let mut frames = Vec::new();
        loop {
            match timeout(quiet, stream.read(&mut buf)).await {
                Ok(Ok(0)) | Err(_) => break,
                Ok(Ok(n)) => {
                    decoder.push_bytes(&buf[..n]);
                    while let Some(frame) = decoder.next_frame() {
                        frames.push(frame);
                    }
                }
                Ok(Err(_)) => break,
            }
        }
        frames
    }
}

#[tokio::test]
async fn two_stations_on_separate_ports_exchange_a_frame() {
    let tc = helpers::start(2, ChannelConfig::default()).await;
    let mut a = helpers::connect(&tc, 0).await;
    let mut b = helpers::connect(&tc, 1).await;

    let wire = helpers::wire_ui("TEST-1", "TEST-2", b"HELLO");
    let sent_at = Instant::now();
    a.write_all(&wire).await.unwrap();

    let frames = helpers::read_frames(&mut b, Duration::from_millis(300)).await;
    assert_eq!(frames.len(), 1, "station B must receive exactly one frame");
    assert!(
        sent_at.elapsed() >= Duration::from_millis(10),
        "delivery must wait out the propagation delay"
    );

    let decoded = Ax25Frame::decode(&frames[0][1..]).unwrap();
    assert_eq!(decoded.payload, b"HELLO");
    assert_eq!(decoded.source.to_string(), "TEST-1");
    assert_eq!(decoded.destination.to_string(), "TEST-2");

    helpers::wait_for(|| {
        tc.channel
            .stations()
            .iter()
            .any(|s| s.rx_count == 1)
    })
    .await;
    let stations = tc.channel.stations();
    let sender = stations.iter().find(|s| s.tx_count == 1).unwrap();
    assert_eq!(sender.rx_count, 0);
}

#[tokio::test]
async fn broadcast_reaches_everyone_except_the_sender() {
    let tc = helpers::start(2, ChannelConfig::default()).await;
    let mut a = helpers::connect(&tc, 0).await;
    let mut b = helpers::connect(&tc, 0).await;
    let mut c = helpers::connect(&tc, 1).await;

    a.write_all(&helpers::wire_ui("TEST-1", "CQ", b"ANYONE?"))
        .await
        .unwrap();

    let b_frames = helpers::read_frames(&mut b, Duration::from_millis(300)).await;
    let c_frames = helpers::read_frames(&mut c, Duration::from_millis(300)).await;
    assert_eq!(b_frames.len(), 1);
    assert_eq!(c_frames.len(), 1);

    // The transmitting station never hears its own frame
    let a_frames = helpers::read_frames(&mut a, Duration::from_millis(150)).await;
    assert!(a_frames.is_empty());
}

#[tokio::test]
async fn escaped_payload_survives_the_relay() {
    let tc = helpers::start(2, ChannelConfig::default()).await;
    let mut a = helpers::connect(&tc, 0).await;
    let mut b = helpers::connect(&tc, 1).await;

    // Payload deliberately contains the delimiter and escape bytes
    let payload = [0xC0, 0xDB, 0xC0, 0x00, 0xDB];
    a.write_all(&helpers::wire_ui("TEST-1", "TEST-2", &payload))
        .await
        .unwrap();

    let frames = helpers::read_frames(&mut b, Duration::from_millis(300)).await;
    assert_eq!(frames.len(), 1);
    let decoded = Ax25Frame::decode(&frames[0][1..]).unwrap();
    assert_eq!(decoded.payload, payload);
}

#[tokio::test]
async fn frame_split_across_writes_is_reassembled() {
    let tc = helpers::start(2, ChannelConfig::default()).await;
    let mut a = helpers::connect(&tc, 0).await;
    let mut b = helpers::connect(&tc, 1).await;

    let wire = helpers::wire_ui("TEST-1", "TEST-2", b"SPLIT DELIVERY");
    let (first, second) = wire.split_at(wire.len() / 2);
    a.write_all(first).await.unwrap();
    tokio::time::sleep(Duration::from_millis(20)).await;
    a.write_all(second).await.unwrap();

    let frames = helpers::read_frames(&mut b, Duration::from_millis(300)).await;
    assert_eq!(frames.len(), 1);
    let decoded = Ax25Frame::decode(&frames[0][1..]).unwrap();
    assert_eq!(decoded.payload, b"SPLIT DELIVERY");
}

#[tokio::test]
async fn disconnect_removes_the_station() {
    let mut tc = helpers::start(2, ChannelConfig::default()).await;
    let a = helpers::connect(&tc, 0).await;
    let _b = helpers::connect(&tc, 1).await;
    assert_eq!(tc.channel.stations().len(), 2);

    drop(a);
    helpers::wait_for(|| tc.channel.stations().len() == 1).await;

    let mut disconnected = None;
    while let Ok(event) = tc.events.try_recv() {
        if let ChannelEvent::StationDisconnected { handle, .. } = event {
            disconnected = Some(handle);
        }
    }
    assert_eq!(disconnected, Some(StationHandle(1)));
}

#[tokio::test]
async fn late_joiner_hears_subsequent_traffic_only() {
    let tc = helpers::start(2, ChannelConfig::default()).await;
    let mut a = helpers::connect(&tc, 0).await;
    let mut b = helpers::connect(&tc, 1).await;

    a.write_all(&helpers::wire_ui("TEST-1", "TEST-2", b"EARLY"))
        .await
        .unwrap();
    let first = helpers::read_frames(&mut b, Duration::from_millis(300)).await;
    assert_eq!(first.len(), 1);

    let mut c = helpers::connect(&tc, 1).await;
    a.write_all(&helpers::wire_ui("TEST-1", "TEST-2", b"LATE"))
        .await
        .unwrap();

    let c_frames = helpers::read_frames(&mut c, Duration::from_millis(300)).await;
    assert_eq!(c_frames.len(), 1);
    let decoded = Ax25Frame::decode(&c_frames[0][1..]).unwrap();
    assert_eq!(decoded.payload, b"LATE");
}
