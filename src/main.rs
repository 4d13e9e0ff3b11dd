use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use kachel::assets::IconImage;
use kachel::model::{ColorHex, EditorState, IconRef};
use kachel::preset::{self, LayoutParams};
use kachel::rendering::projector::{Projector, TextOverflow};
use kachel::EditorConfig;

#[derive(Parser)]
#[command(name = "kachel", version, about = "Compose 450x450 icon tiles")]
struct Cli {
    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render a tile offline from a layout document
    Render {
        /// Output PNG path
        #[arg(long)]
        out: PathBuf,
        /// Layout document (JSON); the Default layout when omitted
        #[arg(long)]
        layout: Option<PathBuf>,
        #[arg(long, default_value = "#6870ef")]
        color: String,
        #[arg(long, default_value = "Alarm")]
        text: String,
        /// Icon image (PNG/JPEG)
        #[arg(long)]
        icon: Option<PathBuf>,
        /// Trim text that runs past the right margin
        #[arg(long)]
        ellipsis: bool,
    },
    #[command(flatten)]
    Remote(RemoteCommand),
}

/// Listings of a running tile service
#[derive(Subcommand)]
enum RemoteCommand {
    /// List color presets of the tile service
    Colors {
        #[arg(long)]
        api: Option<String>,
    },
    /// List icons of the tile service
    Icons {
        #[arg(long)]
        api: Option<String>,
        /// Case-insensitive name filter
        #[arg(long)]
        query: Option<String>,
    },
    /// List layout presets of the tile service
    Presets {
        #[arg(long)]
        api: Option<String>,
    },
    /// List recent renders of the tile service
    Renders {
        #[arg(long)]
        api: Option<String>,
    },
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<EditorConfig> {
    match path {
        Some(p) => Ok(EditorConfig::load(p)?),
        None => Ok(EditorConfig::default()),
    }
}

fn render(
    config: &EditorConfig,
    out: &PathBuf,
    layout: Option<&PathBuf>,
    color: &str,
    text: &str,
    icon: Option<&PathBuf>,
    ellipsis: bool,
) -> anyhow::Result<()> {
    let doc: LayoutParams = match layout {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("reading layout {}", path.display()))?;
            serde_json::from_str(&raw).with_context(|| format!("parsing layout {}", path.display()))?
        }
        None => LayoutParams::default(),
    };

    let mut state = EditorState::new();
    preset::apply_document(&doc, &mut state)?;
    state.set_selected_color(ColorHex::parse(color)?);
    state.set_text(text);

    let icon_image = match icon {
        Some(path) => {
            let bytes = std::fs::read(path).with_context(|| format!("reading icon {}", path.display()))?;
            state.set_selected_icon(Some(IconRef {
                id: path.display().to_string(),
                name: path
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_default(),
                preview_url: path.display().to_string(),
            }));
            match IconImage::decode(&bytes) {
                Ok(img) => Some(img),
                Err(e) => {
                    log::warn!("{}: {}; rendering without icon", path.display(), e);
                    None
                }
            }
        }
        None => None,
    };

    let mut projector = Projector::from_config(config)?;
    if ellipsis {
        projector = Projector::new(projector.typeface().clone(), TextOverflow::Ellipsis);
    }
    let surface = projector.render(&state, icon_image.as_ref());
    std::fs::write(out, surface.encode_png()?)
        .with_context(|| format!("writing {}", out.display()))?;
    println!("{}  {}", surface.digest(), out.display());
    Ok(())
}

#[cfg(feature = "http")]
fn remote(config: &EditorConfig, api: Option<&String>) -> anyhow::Result<kachel::http::HttpStore> {
    let mut config = config.clone();
    if let Some(api) = api {
        config.api_base_url = api.clone();
    }
    Ok(kachel::http::HttpStore::new(&config)?)
}

#[cfg(feature = "http")]
fn list(config: &EditorConfig, command: &RemoteCommand) -> anyhow::Result<()> {
    use kachel::store::{IconQuery, TileStore};

    match command {
        RemoteCommand::Colors { api } => {
            for c in remote(config, api.as_ref())?.list_colors()? {
                println!("{}  {}", c.hex, c.name);
            }
        }
        RemoteCommand::Icons { api, query } => {
            let q = IconQuery {
                query: query.clone(),
                tag: None,
            };
            for i in remote(config, api.as_ref())?.list_icons(&q)? {
                println!("{}  {}  {}", i.id, i.name, i.preview_url);
            }
        }
        RemoteCommand::Presets { api } => {
            for p in remote(config, api.as_ref())?.list_presets()? {
                println!("{}  {}  {}", p.id, p.name, serde_json::to_string(&p.params)?);
            }
        }
        RemoteCommand::Renders { api } => {
            for r in remote(config, api.as_ref())?.list_renders()? {
                println!("{}  {}", r.name, r.download_url);
            }
        }
    }
    Ok(())
}

#[cfg(not(feature = "http"))]
fn list(_config: &EditorConfig, _command: &RemoteCommand) -> anyhow::Result<()> {
    bail!("built without the `http` feature; only `render` is available")
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref())?;

    match &cli.command {
        Command::Render {
            out,
            layout,
            color,
            text,
            icon,
            ellipsis,
        } => {
            if out.as_os_str().is_empty() {
                bail!("--out must not be empty");
            }
            render(&config, out, layout.as_ref(), color, text, icon.as_ref(), *ellipsis)
        }
        Command::Remote(remote) => list(&config, remote),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn listings_parse_as_remote_commands() {
        let cli = Cli::try_parse_from(["kachel", "icons", "--api", "http://tiles:5000", "--query", "bell"])
            .unwrap();
        match cli.command {
            Command::Remote(RemoteCommand::Icons { api, query }) => {
                assert_eq!(api.as_deref(), Some("http://tiles:5000"));
                assert_eq!(query.as_deref(), Some("bell"));
            }
            _ => panic!("expected the icons listing"),
        }
    }

    #[test]
    fn render_takes_global_config() {
        let cli = Cli::try_parse_from(["kachel", "render", "--out", "t.png", "--config", "k.toml"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("k.toml")));
        assert!(matches!(cli.command, Command::Render { ellipsis: false, .. }));
    }
}
