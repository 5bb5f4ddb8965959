//! STAR relay demonstration
//!
//! A hub star socket connects three leaf star sockets. A message sent by one
//! leaf reaches the hub and is relayed by it to the other two leaves.
//!
//! # Run
//!
//! ```sh
//! cargo run --example star_relay
//! ```

use spool::options::OPTION_RECV_DEADLINE;
use spool::{pipe_pair, Socket};
use std::sync::Arc;
use std::time::Duration;

#[compio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    spool::dev_tracing::init_tracing();
    println!("=== STAR Relay Demo ===\n");

    let hub = Socket::star();
    let leaves: Vec<Socket> = (0..3).map(|_| Socket::star()).collect();

    for leaf in &leaves {
        let (hub_end, leaf_end) = pipe_pair(16);
        hub.attach(Arc::new(hub_end))?;
        leaf.attach(Arc::new(leaf_end))?;
        leaf.set_option(OPTION_RECV_DEADLINE, Duration::from_millis(100))?;
    }

    println!("leaf 0 sends \"hello, star\"");
    leaves[0].send("hello, star").await?;

    let at_hub = hub.recv().await?;
    println!("hub received {:?}", String::from_utf8_lossy(&at_hub[0]));

    for (n, leaf) in leaves.iter().enumerate().skip(1) {
        let frames = leaf.recv().await?;
        println!("leaf {n} received {:?}", String::from_utf8_lossy(&frames[0]));
    }

    match leaves[0].recv().await {
        Err(e) if e.is_timeout() => println!("leaf 0 got no echo"),
        other => println!("leaf 0 unexpected: {other:?}"),
    }

    hub.close()?;
    for leaf in &leaves {
        leaf.close()?;
    }
    Ok(())
}
