//! End-to-end tests through the public `Socket` handle.

use spool::options::{OPTION_RAW, OPTION_READ_QLEN, OPTION_RECV_DEADLINE, OPTION_SUBSCRIBE};
use spool::{pipe_pair, Message, OptionValue, Pipe, ProtocolId, Socket, SocketEvent, SpoolError};
use std::sync::Arc;
use std::time::Duration;

#[compio::test]
async fn test_bytes_round_trip_through_xsub() {
    spool::dev_tracing::init_tracing();

    let socket = Socket::xsub();
    let (local, remote) = pipe_pair(4);
    socket.attach(Arc::new(local)).unwrap();

    remote
        .send_msg(Message::new().push_str("topic").push_str("payload"))
        .await
        .unwrap();

    let frames = socket.recv().await.unwrap();
    assert_eq!(frames.len(), 2);
    assert_eq!(frames[0].as_ref(), b"topic");
    assert_eq!(frames[1].as_ref(), b"payload");
}

#[compio::test]
async fn test_star_sockets_talk_to_each_other() {
    let left = Socket::star();
    let right = Socket::star();
    let (a, b) = pipe_pair(8);
    left.attach(Arc::new(a)).unwrap();
    right.attach(Arc::new(b)).unwrap();

    left.send("hello").await.unwrap();
    let msg = right.recv_msg().await.unwrap();
    assert_eq!(msg.parse_frame_str(0).unwrap(), "hello");
}

#[compio::test]
async fn test_monitor_reports_lifecycle() {
    let mut socket = Socket::pull();
    let monitor = socket.monitor();

    let (local, _remote) = pipe_pair(1);
    let id = socket.attach(Arc::new(local)).unwrap();
    socket.detach(id);
    socket.close().unwrap();

    let (late, _late_remote) = pipe_pair(1);
    let late_id = late.id();
    assert!(socket.attach(Arc::new(late)).is_err());

    assert_eq!(monitor.recv_async().await.unwrap(), SocketEvent::PipeAttached(id));
    assert_eq!(monitor.recv_async().await.unwrap(), SocketEvent::PipeDetached(id));
    assert_eq!(monitor.recv_async().await.unwrap(), SocketEvent::Closed);
    match monitor.recv_async().await.unwrap() {
        SocketEvent::AttachRejected { pipe, .. } => assert_eq!(pipe, late_id),
        other => panic!("unexpected event: {other}"),
    }
}

#[compio::test]
async fn test_options_through_facade() {
    let socket = Socket::sub();
    socket.set_option(OPTION_SUBSCRIBE, "x").unwrap();
    socket.set_option(OPTION_READ_QLEN, 4usize).unwrap();
    socket.set_option(OPTION_RECV_DEADLINE, Duration::from_millis(10)).unwrap();

    assert_eq!(socket.get_option(OPTION_READ_QLEN).unwrap(), OptionValue::Int(4));
    assert_eq!(socket.get_option(OPTION_RAW).unwrap(), OptionValue::Bool(false));
    assert!(matches!(
        socket.set_option(OPTION_RAW, true),
        Err(SpoolError::BadOption)
    ));
    assert!(matches!(socket.recv().await, Err(SpoolError::RecvTimeout)));
}

#[compio::test]
async fn test_info_and_contexts() {
    let socket = Socket::xsub();
    let info = socket.info();
    assert_eq!(info.self_id, ProtocolId::Sub);
    assert_eq!(info.peer_name, "pub");
    assert!(matches!(
        socket.open_context(),
        Err(SpoolError::ProtocolOperationUnsupported)
    ));
    assert!(matches!(
        socket.send("nope").await,
        Err(SpoolError::ProtocolOperationUnsupported)
    ));
}

#[compio::test]
async fn test_double_close() {
    let socket = Socket::star();
    assert!(socket.close().is_ok());
    let err = socket.close().unwrap_err();
    assert!(err.is_closed());
}
