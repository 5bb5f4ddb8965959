//! XSUB fan-in demonstration
//!
//! Several publishers feed one XSUB socket over inproc pipes. The receive
//! queue is deliberately small, so a burst overflows it and only the newest
//! messages survive.
//!
//! # Features Demonstrated
//!
//! - Attaching multiple pipes to one socket
//! - Drop-oldest overflow
//! - Receive deadline and close
//! - Socket monitoring
//!
//! # Run
//!
//! ```sh
//! RUST_LOG=spool_proto=debug cargo run --example xsub_fan_in
//! ```

use spool::options::{OPTION_READ_QLEN, OPTION_RECV_DEADLINE};
use spool::{pipe_pair, Message, Pipe, Socket};
use std::sync::Arc;
use std::time::Duration;

#[compio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    spool::dev_tracing::init_tracing();
    println!("=== XSUB Fan-in Demo ===\n");

    let mut socket = Socket::xsub();
    let monitor = socket.monitor();
    socket.set_option(OPTION_READ_QLEN, 4usize)?;
    socket.set_option(OPTION_RECV_DEADLINE, Duration::from_millis(100))?;

    // 1. Attach three publishers
    println!("1. Attaching publishers...");
    let mut publishers = Vec::new();
    for _ in 0..3 {
        let (local, remote) = pipe_pair(16);
        let id = socket.attach(Arc::new(local))?;
        println!("   ✓ Attached {id}");
        publishers.push(remote);
    }
    println!();

    // 2. Burst more messages than the queue holds
    println!("2. Publishing a burst of 9 messages into a queue of 4...");
    for (n, publisher) in publishers.iter().enumerate() {
        for seq in 0..3 {
            let msg = Message::new()
                .push_str("ticker")
                .push_str(&format!("publisher {n} update {seq}"));
            publisher.send_msg(msg).await?;
        }
    }
    compio::time::sleep(Duration::from_millis(20)).await;
    println!();

    // 3. Drain what survived
    println!("3. Receiving (newest messages only)...");
    loop {
        match socket.recv_msg().await {
            Ok(msg) => println!(
                "   [{}] {}",
                msg.pipe().map_or_else(|| "-".to_string(), |p| p.to_string()),
                msg.parse_frame_str(1)?
            ),
            Err(e) if e.is_timeout() => {
                println!("   (deadline reached, queue empty)");
                break;
            }
            Err(e) => return Err(e.into()),
        }
    }
    println!();

    // 4. Close and show the event log
    println!("4. Closing...");
    socket.close()?;
    while let Ok(event) = monitor.try_recv() {
        println!("   event: {event}");
    }

    Ok(())
}
