use std::io::{self, Write};
use std::time::{Duration, Instant};

use clap::Parser;
use crossterm::{
    cursor,
    event::{self, Event, KeyCode},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, Clear, ClearType},
};

use parley_transport::{ChatClient, ClientConfig};

const LOG_LINES: usize = 10;
const DRAW_INTERVAL: Duration = Duration::from_millis(50);

/// Parley chat client.
#[derive(Debug, Parser)]
#[command(name = "parley", about = "Parley chat client")]
struct Args {
    /// Server hostname or IP address.
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Server port.
    #[arg(long, default_value_t = 1234)]
    port: u16,
}

struct App {
    client: ChatClient,
    log: Vec<String>,
    input: String,
    status: String,
    last_draw: Instant,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = ClientConfig::new(args.host, args.port);

    println!("Attempting to connect to {}...", config.addr());
    let client = ChatClient::connect(&config).await?;

    let mut app = App {
        client,
        log: Vec::new(),
        input: String::new(),
        status: "CONNECTED".to_string(),
        last_draw: Instant::now(),
    };
    app.log.push(format!("Connected to {}", config.addr()));

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, Clear(ClearType::All), cursor::Hide)?;

    if let Err(e) = app.run().await {
        app.log.push(format!("Error: {}", e));
    }

    disable_raw_mode()?;
    execute!(stdout, cursor::Show)?;
    println!("\nChat ended.");
    Ok(())
}

impl App {
    async fn run(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        loop {
            if Instant::now().duration_since(self.last_draw) > DRAW_INTERVAL {
                self.draw()?;
                self.last_draw = Instant::now();
            }

            tokio::select! {
                line = self.client.recv() => {
                    match line {
                        Some(line) => self.log.push(line),
                        None => {
                            self.status = "DISCONNECTED".to_string();
                            self.draw()?;
                            return Ok(());
                        }
                    }
                }
                poll = tokio::task::spawn_blocking(|| event::poll(Duration::from_millis(10))) => {
                    if matches!(poll, Ok(Ok(true))) {
                        if let Event::Key(key) = event::read()? {
                            match key.code {
                                KeyCode::Enter => {
                                    if !self.input.is_empty() {
                                        let text = std::mem::take(&mut self.input);
                                        if self.handle_input(text).await? {
                                            return Ok(());
                                        }
                                    }
                                }
                                KeyCode::Char(c) => self.input.push(c),
                                KeyCode::Backspace => { self.input.pop(); }
                                KeyCode::Esc => return Ok(()),
                                _ => {}
                            }
                        }
                    }
                }
            }
        }
    }

    /// Apply one entered line. Returns true when the user asked to quit.
    ///
    /// Setting commands (`.mode`, the quit forms) are handled locally and
    /// never sent; send commands (`/w`, `/noe`) adjust how the next
    /// message travels and then send it.
    async fn handle_input(&mut self, text: String) -> Result<bool, Box<dyn std::error::Error>> {
        let key = match text.split_once(' ') {
            Some((key, _)) => key,
            None => text.as_str(),
        };

        match key {
            ".mode" => {
                let on = self.client.toggle_obfuscation().await;
                self.log.push(if on {
                    "Changed mode to encrypted r/w.".to_string()
                } else {
                    "Changed mode to regular r/w.".to_string()
                });
            }
            ".quit" | "quit()" | ".disconnect" | "disconnect()" => return Ok(true),
            "/noe" => {
                // Send the remainder in the clear, once.
                self.client.skip_encode_once().await;
                if let Some(rest) = text.strip_prefix("/noe ") {
                    if !rest.is_empty() {
                        self.client.send(rest).await?;
                    }
                }
            }
            "/w" => {
                // Whispers travel in the clear so the receiving side's
                // exemption heuristic can pass them through.
                self.client.skip_encode_once().await;
                self.client.send(text).await?;
            }
            _ => self.client.send(text).await?,
        }
        Ok(false)
    }

    fn draw(&self) -> io::Result<()> {
        let mut stdout = io::stdout();
        execute!(stdout, cursor::MoveTo(0, 0))?;

        println!("Parley | Status: {}", self.status);
        println!("{}", "=".repeat(60));

        for i in 0..LOG_LINES {
            execute!(stdout, cursor::MoveTo(0, 2 + i as u16))?;
            execute!(stdout, Clear(ClearType::CurrentLine))?;
            if let Some(line) = self.log.get(self.log.len().saturating_sub(LOG_LINES) + i) {
                println!("{}", line);
            }
        }

        execute!(stdout, cursor::MoveTo(0, 2 + LOG_LINES as u16))?;
        println!("{}", "-".repeat(60));
        execute!(stdout, Clear(ClearType::CurrentLine))?;
        print!("> {}", self.input);
        stdout.flush()?;
        Ok(())
    }
}
