use anyhow::Result;
use assistant_core::{Assistant, AssistantConfig, CommandOutcome, DispatchOutcome, Shortcut};
use clap::{ArgAction, Parser, ValueEnum};
use intent_resolver::{IntentResolver, Persona};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use voice_io::{CaptureEvent, ChannelCapture, Transcript};

mod console;
use console::{ConsoleHost, ConsoleSpeech, ConsoleSpeechHandle};

#[derive(Parser, Debug)]
#[command(name = "jarvis", version, about = "J.A.R.V.I.S. / Alya assistant console")]
struct Args {
    /// Config file path (created with defaults if missing)
    #[arg(long, default_value = "assistant.json")]
    config: String,

    /// Persona to speak with
    #[arg(long, value_enum)]
    persona: Option<PersonaArg>,

    /// Use the built-in keyword resolver instead of the language model
    #[arg(long, action = ArgAction::SetTrue)]
    offline: bool,

    /// Chat completions endpoint
    #[arg(long)]
    endpoint: Option<String>,

    /// Model name sent to the endpoint
    #[arg(long)]
    model: Option<String>,

    /// Command to run; repeatable
    #[arg(long)]
    command: Vec<String>,

    /// Keep reading commands from stdin after --command ones
    #[arg(long, action = ArgAction::SetTrue)]
    interactive: bool,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum PersonaArg {
    Jarvis,
    Alya,
}

impl From<PersonaArg> for Persona {
    fn from(arg: PersonaArg) -> Self {
        match arg {
            PersonaArg::Jarvis => Persona::Jarvis,
            PersonaArg::Alya => Persona::Alya,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    setup_tracing();

    let args = Args::parse();
    let mut config = AssistantConfig::load(&args.config)
        .map_err(|e| anyhow::anyhow!("Failed to load config {}: {}", args.config, e))?;
    if let Some(persona) = args.persona {
        config.persona = persona.into();
    }
    if let Some(endpoint) = &args.endpoint {
        config.resolver.endpoint = endpoint.clone();
    }
    if let Some(model) = &args.model {
        config.resolver.model = model.clone();
    }

    assistant_core::init()?;

    let resolver: Arc<dyn IntentResolver> = if args.offline {
        info!("Using offline keyword resolver");
        Arc::new(intent_resolver::create_keyword_resolver(&config.resolver)?)
    } else {
        info!("Using intent service at {}", config.resolver.endpoint);
        Arc::new(intent_resolver::create_http_resolver(&config.resolver)?)
    };

    let (capture, transcripts) = ChannelCapture::new();
    let (speech, speech_handle) = ConsoleSpeech::new();
    let assistant = Assistant::new(
        &config,
        resolver,
        Arc::new(ConsoleHost::new()),
        Box::new(capture),
        Box::new(speech),
    );
    assistant.on_status_change(|change| {
        tracing::debug!(from = %change.from, to = %change.to, "status");
    });

    println!("{} is online.", config.persona);
    if let Err(e) = assistant.toggle_on() {
        warn!("voice input disabled: {}", e);
    }

    let mut console = Console {
        assistant: &assistant,
        speech: speech_handle,
        transcripts,
        last_seen: 0,
    };

    for command in &args.command {
        console.run_line(command).await;
    }
    if !args.command.is_empty() && !args.interactive {
        return Ok(());
    }

    println!("Type a command. !wake, !say <text>, !toggle, !log, !persona <name>, !quit");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if !console.run_line(&line).await {
            break;
        }
    }

    assistant.toggle_off();
    Ok(())
}

struct Console<'a> {
    assistant: &'a Assistant,
    speech: ConsoleSpeechHandle,
    transcripts: std::sync::mpsc::Sender<CaptureEvent>,
    last_seen: u64,
}

impl Console<'_> {
    /// Handle one input line. Returns false when the user asked to quit.
    async fn run_line(&mut self, line: &str) -> bool {
        let line = line.trim();
        if let Some(shortcut) = Shortcut::parse(line) {
            let state = self.assistant.handle_shortcut(shortcut);
            println!(
                "  terminal={} secondary={} palette={}",
                state.open, state.secondary_open, state.palette_open
            );
            return true;
        }

        match line.split_once(' ').map_or((line, ""), |(a, b)| (a, b.trim())) {
            ("!quit" | "!exit", _) => return false,
            ("!toggle", _) => match self.assistant.toggle() {
                Ok(status) => println!("  status: {}", status),
                Err(e) => println!("  voice input unavailable: {}", e),
            },
            ("!log", _) => {
                for message in self.assistant.snapshot() {
                    println!("  #{} [{:?}] {}", message.id, message.kind, message.content);
                }
            }
            ("!persona", name) => match Persona::from_name(name) {
                Some(persona) => {
                    self.assistant.set_persona(persona);
                    println!("  persona: {}", persona);
                }
                None => println!("  unknown persona {:?}", name),
            },
            ("!wake", _) => {
                self.feed(CaptureEvent::WakeWord).await;
            }
            ("!say", text) => {
                self.feed(CaptureEvent::Transcript(Transcript::final_text(text)))
                    .await;
            }
            _ => {
                let outcome = self.assistant.process_command(line).await;
                self.report(&outcome);
                self.assistant.close_palette();
            }
        }
        self.print_new_entries();
        self.drain_speech();
        true
    }

    async fn feed(&mut self, event: CaptureEvent) {
        if self.transcripts.send(event).is_err() {
            println!("  microphone closed");
            return;
        }
        for outcome in self.assistant.pump_capture().await {
            self.report(&outcome);
        }
        println!("  status: {}", self.assistant.status());
    }

    fn report(&self, outcome: &CommandOutcome) {
        match outcome {
            CommandOutcome::Ignored(reason) => println!("  (ignored: {:?})", reason),
            CommandOutcome::Dispatched { kind, outcome } => match outcome {
                DispatchOutcome::Handled => info!("dispatched {}", kind),
                DispatchOutcome::Unsupported => warn!("unsupported action {}", kind),
                DispatchOutcome::Failed(e) => warn!("{} failed: {}", kind, e),
            },
            CommandOutcome::Failed { message } => warn!("{}", message),
            CommandOutcome::Discarded => info!("result discarded"),
            CommandOutcome::Greeted => info!("listening"),
        }
    }

    fn print_new_entries(&mut self) {
        for message in self.assistant.snapshot() {
            if message.id > self.last_seen {
                println!("  {:?}> {}", message.kind, message.content);
                self.last_seen = message.id;
            }
        }
    }

    /// Console speech is instantaneous; mark everything played.
    fn drain_speech(&self) {
        while let Some(id) = self.speech.finish() {
            self.assistant.playback_ended(id);
        }
    }
}

fn setup_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}
