use bincode::{deserialize, serialize};
use shared::Packet;
use std::net::SocketAddr;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::net::UdpSocket;
use tokio::time::{sleep, timeout};

// Get current timestamp in milliseconds
fn get_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::from_secs(0))
        .as_millis() as u64
}

fn describe(packet: &Packet) -> String {
    match packet {
        Packet::Snapshot { state } => format!(
            "Snapshot: {} players, {} flames, scores green {} purple {}, {}s left",
            state.players.len(),
            state.flames.len(),
            state.team_scores.green,
            state.team_scores.purple,
            state.time_left
        ),
        other => format!("{:?}", other),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Create local socket
    let socket = UdpSocket::bind("0.0.0.0:0").await?;
    println!("Client socket bound to {}", socket.local_addr()?);

    // Server address
    let server_addr = "127.0.0.1:8080".parse::<SocketAddr>()?;

    // Send connection request
    let connect_packet = Packet::Connect { client_version: 1 };
    println!("Sending connection request to {}", server_addr);
    socket.send_to(&serialize(&connect_packet)?, server_addr).await?;

    // Buffer for receiving data
    let mut buf = [0u8; 8192];

    // Wait for the handshake
    println!("Waiting for server response...");
    let (len, addr) = socket.recv_from(&mut buf).await?;
    println!("Received {} bytes from {}", len, addr);

    let client_id = match deserialize::<Packet>(&buf[0..len]) {
        Ok(Packet::Connected { client_id }) => {
            println!("Connection accepted with client ID: {}", client_id);
            client_id
        }
        Ok(other) => {
            println!("Connection refused: {:?}", other);
            return Ok(());
        }
        Err(e) => {
            println!("Failed to deserialize response: {}", e);
            return Ok(());
        }
    };

    // The initial full snapshot follows immediately, sent to us alone.
    if let Ok(Ok((len, _))) = timeout(Duration::from_secs(1), socket.recv_from(&mut buf)).await {
        if let Ok(packet) = deserialize::<Packet>(&buf[0..len]) {
            println!("Initial {}", describe(&packet));
        }
    }

    // Walk a diagonal path across the arena, 5 units per step, printing
    // whatever the server pushes back between moves.
    let mut x = 50.0f32;
    let mut y = 50.0f32;

    for step in 0..20 {
        x += 5.0;
        y += 5.0;

        let move_packet = Packet::Move { x, y };
        println!("Step {}: sending move to ({}, {})", step, x, y);
        socket.send_to(&serialize(&move_packet)?, server_addr).await?;

        // Keep the session alive even if every move gets throttled.
        let heartbeat = Packet::Heartbeat {
            timestamp: get_timestamp(),
        };
        socket.send_to(&serialize(&heartbeat)?, server_addr).await?;

        // Drain pushes for half a second: snapshots, timer updates, and
        // eventually game-over notifications.
        while let Ok(Ok((len, _))) =
            timeout(Duration::from_millis(500), socket.recv_from(&mut buf)).await
        {
            match deserialize::<Packet>(&buf[0..len]) {
                Ok(packet) => println!("  {}", describe(&packet)),
                Err(e) => println!("  Failed to deserialize push: {}", e),
            }
        }

        sleep(Duration::from_millis(250)).await;
    }

    println!("Client {} disconnecting", client_id);
    socket.send_to(&serialize(&Packet::Disconnect)?, server_addr).await?;

    Ok(())
}
