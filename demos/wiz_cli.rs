//! Command-line front-end for WiZ bulbs.
//!
//! Discovers bulbs, switches them, applies presets and runs fades.
//! Set `RUST_LOG=debug` to see every datagram.
//!
//! Run with: cargo run --example wiz_cli -- --help

use std::net::Ipv4Addr;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use wiz_controller::{
    Brightness, BuiltinPreset, Color, DeviceRegistry, Kelvin, Light, LightState, PowerMode, Preset,
    PresetStore, Settings, Tone,
};

#[derive(Parser)]
#[command(name = "wiz-cli")]
#[command(about = "Control WiZ smart bulbs from the command line", long_about = None)]
struct Cli {
    /// IP address of the bulb (not required for discover and preset list)
    #[arg(short, long, global = true)]
    ip: Option<Ipv4Addr>,

    /// UDP port the bulbs listen on
    #[arg(long, global = true, default_value_t = Settings::DEFAULT_PORT)]
    port: u16,

    /// How long to wait for a reply, in milliseconds
    #[arg(long, global = true, default_value = "1000")]
    timeout: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Discover all bulbs on the network
    Discover {
        /// How long to listen for answers, in milliseconds
        #[arg(short, long, default_value = "3500")]
        window: u64,
    },

    /// Query the bulb's current state
    Status,

    /// Turn the bulb on
    On,

    /// Turn the bulb off
    Off,

    /// Toggle the bulb on/off
    Toggle,

    /// Set brightness (values outside 0-100 are pinned to the nearest bound)
    Brightness {
        #[arg(allow_negative_numbers = true)]
        level: i64,
    },

    /// Set white temperature in Kelvin
    Temperature { kelvin: u16 },

    /// Set RGB color as "r,g,b" or "#RRGGBB"
    Color { color: Color },

    /// Manage and apply presets
    Preset {
        /// JSON file holding user presets
        #[arg(long, default_value = "presets.json")]
        presets: PathBuf,

        #[command(subcommand)]
        action: PresetAction,
    },

    /// Fade from the current state to a target
    Fade {
        /// Target brightness (0-100)
        #[arg(long)]
        brightness: Option<u8>,

        /// Target white temperature in Kelvin
        #[arg(long, conflicts_with = "color")]
        temperature: Option<u16>,

        /// Target color as "r,g,b" or "#RRGGBB"
        #[arg(long)]
        color: Option<Color>,

        /// Total length of the fade in milliseconds
        #[arg(long, default_value = "2000")]
        duration: u64,

        /// Time between steps in milliseconds
        #[arg(long, default_value = "100")]
        tick: u64,
    },
}

#[derive(Subcommand)]
enum PresetAction {
    /// List built-in and saved presets
    List,

    /// Apply a preset to the bulb
    Apply { name: String },

    /// Save the bulb's current brightness and tone under a name
    Save { name: String },

    /// Delete a saved preset
    Delete { name: String },
}

fn describe(state: &LightState) -> String {
    let mut parts = Vec::new();
    if let Some(on) = state.is_on() {
        parts.push(if on { "ON".to_string() } else { "OFF".to_string() });
    }
    if let Some(brightness) = state.brightness {
        parts.push(format!("{}%", brightness.value()));
    }
    match state.tone {
        Some(Tone::White { temperature }) => parts.push(format!("{}K", temperature.kelvin())),
        Some(Tone::Rgb(color)) => parts.push(format!("RGB({color}) {}", color.to_hex())),
        None => {}
    }
    parts.join("  ")
}

fn describe_preset(preset: &Preset) -> String {
    describe(&LightState {
        power: None,
        ..preset.state()
    })
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let cli = Cli::parse();

    let settings = Settings::default()
        .with_port(cli.port)
        .with_reply_timeout(Duration::from_millis(cli.timeout));

    if let Commands::Discover { window } = cli.command {
        println!("Discovering bulbs on the network ({window}ms)...");
        let mut registry =
            DeviceRegistry::new(settings.with_discovery_timeout(Duration::from_millis(window)));
        if registry.rescan().await? == 0 {
            println!("No bulbs found on the network.");
            return Ok(());
        }

        println!("\nFound {} bulb(s):", registry.len());
        for light in registry.lights() {
            let kind = light
                .bulb_type()
                .map(|t| format!("{} ({})", t.name, t.class))
                .unwrap_or_else(|| "unknown".to_string());
            println!(
                "  IP: {:15}  MAC: {:12}  {}",
                light.ip().to_string(),
                light.mac().unwrap_or("?"),
                kind
            );
        }
        return Ok(());
    }

    if let Commands::Preset {
        presets,
        action: PresetAction::List,
    } = &cli.command
    {
        let store = PresetStore::load(presets)?;
        println!("Built-in presets:");
        for (builtin, preset) in PresetStore::builtins() {
            println!("  {:12} {}", builtin.to_string(), describe_preset(&preset));
        }
        if !store.is_empty() {
            println!("\nSaved presets ({}):", store.path().display());
            for (name, preset) in store.custom() {
                println!("  {:12} {}", name, describe_preset(preset));
            }
        }
        return Ok(());
    }

    // Everything below talks to one bulb
    let ip = cli
        .ip
        .ok_or("IP address is required for this command. Use --ip <IP>")?;
    let mut light = Light::new(ip, settings);

    match cli.command {
        Commands::Discover { .. } => unreachable!(),

        Commands::Status => {
            let state = light.get_state().await?;
            println!("{ip}: {}", describe(&state));
            if let Ok(bulb) = light.refresh_identity().await {
                println!("  Module: {} ({})", bulb.name, bulb.class);
                if let Some(mac) = light.mac() {
                    println!("  MAC: {mac}");
                }
            }
        }

        Commands::On => {
            light.set_power(PowerMode::On).await?;
            println!("Bulb turned ON");
        }

        Commands::Off => {
            light.set_power(PowerMode::Off).await?;
            println!("Bulb turned OFF");
        }

        Commands::Toggle => {
            light.toggle().await?;
            println!("Bulb is now {}", describe(&light.state().await));
        }

        Commands::Brightness { level } => {
            light.set_brightness(level).await?;
            println!("Brightness set to {}", describe(&light.state().await));
        }

        Commands::Temperature { kelvin } => {
            let _ = light.refresh_identity().await;
            light.set_temperature(kelvin).await?;
            println!("Temperature set to {kelvin}K");
        }

        Commands::Color { color } => {
            light.set_rgb(color.red(), color.green(), color.blue()).await?;
            println!("Color set to RGB({color})");
        }

        Commands::Preset { presets, action } => {
            let mut store = PresetStore::load(&presets)?;
            match action {
                PresetAction::List => unreachable!(),
                PresetAction::Apply { name } => {
                    let preset = store
                        .get(&name)
                        .ok_or_else(|| format!("no preset named {name:?}"))?;
                    light.apply_preset(&preset).await?;
                    println!("Applied {name}: {}", describe_preset(&preset));
                }
                PresetAction::Save { name } => {
                    let state = light.get_state().await?;
                    let (Some(brightness), Some(tone)) = (state.brightness, state.tone) else {
                        return Err("the bulb did not report a brightness and tone".into());
                    };
                    let preset = Preset { brightness, tone };
                    store.insert(&name, preset)?;
                    store.save()?;
                    println!("Saved {name}: {}", describe_preset(&preset));
                }
                PresetAction::Delete { name } => {
                    if name.parse::<BuiltinPreset>().is_ok() {
                        return Err(format!("{name} is a built-in preset").into());
                    }
                    if store.remove(&name).is_none() {
                        return Err(format!("no saved preset named {name:?}").into());
                    }
                    store.save()?;
                    println!("Deleted {name}");
                }
            }
        }

        Commands::Fade {
            brightness,
            temperature,
            color,
            duration,
            tick,
        } => {
            let mut end = LightState::default();
            if let Some(level) = brightness {
                end = end.with_brightness(
                    Brightness::create(level).ok_or("brightness must be between 0 and 100")?,
                );
            }
            if let Some(kelvin) = temperature {
                let _ = light.refresh_identity().await;
                end = end.with_temperature(
                    Kelvin::create(kelvin).ok_or("temperature must be between 1000K and 8000K")?,
                );
            }
            if let Some(color) = color {
                end = end.with_color(color);
            }

            println!("Fading {ip} to {} over {duration}ms...", describe(&end));
            let handle = light.fade_to(end, duration, tick).await?;
            let report = handle.wait().await;
            println!(
                "Fade {} finished: {}/{} steps sent, {} failed",
                report.id, report.sent, report.steps, report.failed
            );
        }
    }

    Ok(())
}
