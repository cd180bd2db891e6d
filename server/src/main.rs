use clap::Parser;
use server::arena;
use server::game::GameState;
use server::network::Server;

/// Main-method of the application.
/// Parses command-line arguments, generates the arena, then runs the
/// server until it stops or Ctrl+C arrives.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Command line arguments
    #[derive(Parser, Debug)]
    #[clap(author, version, about)]
    struct Args {
        /// Server IP address to bind to
        #[clap(short = 'H', long, default_value = "127.0.0.1")]
        host: String,
        /// Server port to listen on
        #[clap(short, long, default_value = "8080")]
        port: u16,
        /// Number of flames scattered at match start
        #[clap(short, long, default_value_t = shared::FLAME_COUNT)]
        flames: usize,
        /// Match duration in seconds
        #[clap(short, long, default_value_t = shared::MATCH_DURATION_SECS)]
        duration: u32,
        /// Maximum number of concurrent clients
        #[clap(short, long, default_value = "32")]
        max_clients: usize,
        /// Keep applying movement (and scoring) after the clock expires
        #[clap(long)]
        allow_moves_after_match: bool,
    }

    let args = Args::parse();
    env_logger::init();

    // Generate the arena up front; an unsatisfiable configuration is a
    // fatal startup error.
    let mut rng = rand::thread_rng();
    let obstacles = arena::generate_obstacles(&mut rng)?;
    let flames = arena::generate_flames(args.flames, &obstacles, &mut rng)?;

    let game_state = GameState::new(
        obstacles,
        flames,
        args.duration,
        args.allow_moves_after_match,
    );

    let address = format!("{}:{}", args.host, args.port);
    let mut server = Server::new(&address, args.max_clients, game_state).await?;

    // Handle shutdown gracefully
    tokio::select! {
        result = server.run() => {
            if let Err(e) = result {
                eprintln!("Server error: {}", e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            println!("Received Ctrl+C, shutting down gracefully...");
        }
    }

    Ok(())
}
