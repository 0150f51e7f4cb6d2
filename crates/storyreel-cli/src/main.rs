//! StoryReel command-line front end.

mod export;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use storyreel_client::{StudioBackend, StudioClient};
use storyreel_models::wire::ProjectDetails;
use storyreel_models::{
    from_wire_index, ArtifactClass, ArtifactKey, Frame, SceneRef, Script, Slot, SlotKind,
};
use storyreel_studio::{GenerationOptions, ShotField, Studio, StudioConfig};

#[derive(Parser)]
#[command(name = "storyreel", about = "Drive a StoryReel project from the terminal", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Chapter and scene, numbered from 1.
#[derive(Args, Debug, Clone, Copy)]
struct SceneArgs {
    #[arg(long)]
    chapter: u32,
    #[arg(long)]
    scene: u32,
}

impl SceneArgs {
    fn scene_ref(&self) -> Result<SceneRef> {
        Ok(SceneRef::new(
            index(self.chapter, "chapter")?,
            index(self.scene, "scene")?,
        ))
    }
}

/// What the backend writes a new script from.
#[derive(Args, Debug)]
struct NewProjectArgs {
    project: String,
    #[arg(long)]
    genre: String,
    #[arg(long)]
    subject: String,
    #[arg(long, default_value = "")]
    special_instructions: String,
    #[arg(long, default_value = "")]
    background: String,
    #[arg(long, default_value = "N/A")]
    main_character: String,
    #[arg(long, default_value_t = 1)]
    chapters: u32,
    #[arg(long, default_value_t = 1)]
    scenes: u32,
    #[arg(long, default_value_t = 1)]
    shots: u32,
    #[arg(long)]
    black_and_white: bool,
}

impl From<NewProjectArgs> for ProjectDetails {
    fn from(args: NewProjectArgs) -> Self {
        ProjectDetails {
            special_instructions: args.special_instructions,
            story_background: args.background,
            main_character_description: args.main_character,
            number_of_chapters: args.chapters,
            number_of_scenes: args.scenes,
            number_of_shots: args.shots,
            black_and_white: args.black_and_white,
            ..ProjectDetails::new(args.project, args.genre, args.subject)
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// List the backend's projects
    Projects,

    /// Print a project's script as JSON
    Script { project: String },

    /// Have the backend write a new script and print it
    NewProject(NewProjectArgs),

    /// Ask the backend to render every image of a project
    GenerateImages { project: String },

    /// Ask the backend to assemble a project's final video
    AssembleVideo { project: String },

    /// Print the JSON schema of the script document
    Schema,

    /// List cached media, for the whole project or one scene
    Media {
        project: String,
        #[arg(long, requires = "scene")]
        chapter: Option<u32>,
        #[arg(long, requires = "chapter")]
        scene: Option<u32>,
    },

    /// Generate one artifact
    Generate {
        project: String,
        /// opening_image, closing_image, music, shot_video or scene_video
        slot: SlotKind,
        #[command(flatten)]
        at: SceneArgs,
        #[arg(long)]
        shot: Option<u32>,
        /// Image prompt used instead of the shot description
        #[arg(long)]
        prompt: Option<String>,
        #[arg(long)]
        seed: Option<u64>,
        #[arg(long)]
        model: Option<String>,
    },

    /// Generate every artifact of one kind, one after another
    GenerateAll {
        project: String,
        slot: SlotKind,
        /// Only list what would be generated
        #[arg(long)]
        dry_run: bool,
    },

    /// Change one text field of a shot
    EditShot {
        project: String,
        #[command(flatten)]
        at: SceneArgs,
        #[arg(long)]
        shot: u32,
        /// opening, closing or director
        #[arg(long)]
        field: ShotField,
        #[arg(long)]
        value: String,
    },

    /// Replace or rewrite a scene's narration
    Narration {
        project: String,
        #[command(flatten)]
        at: SceneArgs,
        #[arg(long, conflicts_with = "instructions", required_unless_present = "instructions")]
        text: Option<String>,
        /// Let the backend rewrite the narration following these instructions
        #[arg(long)]
        instructions: Option<String>,
    },

    /// Write a cached shot image to a file
    ExportImage {
        project: String,
        #[command(flatten)]
        at: SceneArgs,
        #[arg(long)]
        shot: u32,
        #[arg(long, default_value = "opening")]
        frame: Frame,
        #[arg(long)]
        out: PathBuf,
    },
}

fn index(number: u32, what: &str) -> Result<usize> {
    from_wire_index(number).ok_or_else(|| anyhow!("{what} numbers start at 1"))
}

fn init_tracing() {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn,storyreel=info"));

    // Logs go to stderr so command output stays pipeable.
    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .with(env_filter)
            .init();
    }
}

fn print_json(value: &impl serde::Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn session(client: &Arc<StudioClient>, project: String) -> Studio {
    let codec = client.config().key_codec();
    let backend: Arc<dyn StudioBackend> = client.clone();
    Studio::builder(project, backend)
        .codec(codec)
        .config(StudioConfig::from_env())
        .build()
}

async fn run(command: Commands, client: Arc<StudioClient>) -> Result<()> {
    match command {
        Commands::Projects => {
            for project in client.list_projects().await? {
                println!("{project}");
            }
        }

        Commands::Script { project } => {
            let script = client.load_script(&project).await?;
            print_json(&script)?;
        }

        Commands::NewProject(args) => {
            let details = ProjectDetails::from(args);
            let studio = session(&client, details.project.clone());
            let script = studio.create_project(&details).await?;
            print_json(&*script)?;
        }

        Commands::GenerateImages { project } => {
            let studio = session(&client, project);
            studio.load_script().await?;
            studio.start_image_generation().await?;
        }

        Commands::AssembleVideo { project } => {
            let studio = session(&client, project);
            studio.load_script().await?;
            studio.assemble_video().await?;
        }

        Commands::Schema => {
            print_json(&schemars::schema_for!(Script))?;
        }

        Commands::Media {
            project,
            chapter,
            scene,
        } => {
            let studio = session(&client, project);
            match chapter.zip(scene) {
                Some((chapter, scene)) => {
                    let at = SceneArgs { chapter, scene }.scene_ref()?;
                    studio.refresh_scene(at).await?;
                }
                None => studio.refresh_project().await?,
            }
            let maps: Vec<_> = ArtifactClass::ALL
                .iter()
                .map(|&class| (class, studio.cache().snapshot(class)))
                .collect();
            print_json(&export::media_summary(
                maps.iter().map(|(class, map)| (*class, map)),
            ))?;
        }

        Commands::Generate {
            project,
            slot,
            at,
            shot,
            prompt,
            seed,
            model,
        } => {
            let shot = shot.map(|n| index(n, "shot")).transpose()?;
            let slot = Slot::new(slot, at.scene_ref()?, shot)
                .ok_or_else(|| anyhow!("{slot} needs --shot"))?;

            let options = GenerationOptions {
                custom_prompt: prompt,
                seed,
                model,
                ..GenerationOptions::default()
            };

            let studio = session(&client, project);
            studio.open().await?;
            match studio.generate(slot, &options).await? {
                Some(artifact) => println!("{}", export::describe(&artifact)),
                None => info!(%slot, "submitted; the artifact is not available yet"),
            }
        }

        Commands::GenerateAll {
            project,
            slot,
            dry_run,
        } => {
            let studio = session(&client, project);
            studio.open().await?;
            if dry_run {
                let codec = studio.codec();
                for pending in studio.pending(slot)? {
                    println!("{}", pending.key(&codec));
                }
            } else {
                let report = studio.generate_all(slot, &GenerationOptions::default()).await?;
                print_json(&report)?;
            }
        }

        Commands::EditShot {
            project,
            at,
            shot,
            field,
            value,
        } => {
            let at = at.scene_ref()?.shot(index(shot, "shot")?);
            let studio = session(&client, project);
            studio.load_script().await?;
            let script = studio.edit_shot(at, field, value).await?;
            print_json(&script.shot(at))?;
        }

        Commands::Narration {
            project,
            at,
            text,
            instructions,
        } => {
            let at = at.scene_ref()?;
            let studio = session(&client, project);
            studio.load_script().await?;
            let script = match (text, instructions) {
                (Some(text), _) => studio.edit_narration(at, text).await?,
                (None, Some(instructions)) => studio.regenerate_narration(at, instructions).await?,
                (None, None) => bail!("pass --text or --instructions"),
            };
            if let Some(scene) = script.scene(at) {
                println!("{}", scene.narration_text);
            }
        }

        Commands::ExportImage {
            project,
            at,
            shot,
            frame,
            out,
        } => {
            let at = at.scene_ref()?.shot(index(shot, "shot")?);
            let studio = session(&client, project);
            studio.refresh_scene(at.scene_ref()).await?;

            let key = ArtifactKey::image(at, frame);
            let artifact = studio
                .cache()
                .get(ArtifactClass::Image, &key)
                .with_context(|| format!("no {frame} image for {at}"))?;
            let written = export::write_image(&artifact, &out)?;
            info!(key = %key, bytes = written, path = %out.display(), "image exported");
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let client = Arc::new(StudioClient::from_env().context("failed to create backend client")?);
    run(cli.command, client).await
}
