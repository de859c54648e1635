use assistant_core::{AppHost, ArcadeCommand, GenerationRequest, SearchProvider};
use intent_resolver::{
    AssistantContext, ContentType, Dialog, NewsQuery, Params, Route, Theme,
};
use std::sync::{Arc, Mutex, MutexGuard};
use voice_io::{SpeechError, SpeechOutput, Utterance};

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Host that prints side effects instead of driving a real UI.
pub struct ConsoleHost {
    context: Mutex<AssistantContext>,
}

impl ConsoleHost {
    pub fn new() -> Self {
        Self {
            context: Mutex::new(AssistantContext::default()),
        }
    }
}

impl AppHost for ConsoleHost {
    fn context(&self) -> AssistantContext {
        lock(&self.context).clone()
    }

    fn current_route(&self) -> String {
        lock(&self.context).route.clone()
    }

    fn navigate(&self, route: Route) -> anyhow::Result<()> {
        println!("  -> navigate {}", route);
        lock(&self.context).route = route.path().to_string();
        Ok(())
    }

    fn start_generation(&self, request: GenerationRequest) -> anyhow::Result<()> {
        match request {
            GenerationRequest::Notes { topic } => println!("  -> generating notes on {}", topic),
            GenerationRequest::Test(req) => println!(
                "  -> generating {} {} questions on {}{}",
                req.num_questions,
                req.difficulty.as_str(),
                req.topic.as_deref().unwrap_or("a mixed topic"),
                req.timer_minutes
                    .map(|m| format!(" ({} min)", m))
                    .unwrap_or_default()
            ),
            GenerationRequest::CollegeNotes(req) => println!(
                "  -> generating {} notes: {} sem {} {} unit {}",
                req.university, req.branch, req.semester, req.subject, req.unit
            ),
        }
        Ok(())
    }

    fn show_news(&self, query: &NewsQuery) -> anyhow::Result<()> {
        println!(
            "  -> news: {}{}",
            query.category,
            query
                .query
                .as_deref()
                .map(|q| format!(" about {}", q))
                .unwrap_or_default()
        );
        Ok(())
    }

    fn search(&self, provider: SearchProvider, query: &str) -> anyhow::Result<()> {
        println!("  -> search {:?} for {:?}", provider, query);
        Ok(())
    }

    fn switch_tab(&self, tab: &str) -> anyhow::Result<()> {
        println!("  -> tab {}", tab);
        Ok(())
    }

    fn set_theme(&self, theme: Theme) -> anyhow::Result<()> {
        println!("  -> theme {}", theme.as_str());
        Ok(())
    }

    fn set_language(&self, language: &str) -> anyhow::Result<()> {
        println!("  -> language {}", language);
        lock(&self.context).language = language.to_string();
        Ok(())
    }

    fn fetch_content(&self, content: ContentType) -> anyhow::Result<String> {
        let text = match content {
            ContentType::DailyQuote => "The beautiful thing about learning is that nobody can take it away from you.",
            ContentType::MathFact => "Zero is the only number that cannot be represented in Roman numerals.",
            ContentType::DailyQuests => "Finish one practice test, review ten flashcards and read one news story.",
            ContentType::WelcomeMessage => "Welcome back. Ready to learn something new today?",
            ContentType::TotalLearners => "Over twelve thousand learners studied here this week.",
        };
        Ok(text.to_string())
    }

    fn open_recent_topic(&self, topic: Option<&str>) -> anyhow::Result<()> {
        println!("  -> recent topic {}", topic.unwrap_or("(latest)"));
        Ok(())
    }

    fn open_dialog(&self, dialog: Dialog) -> anyhow::Result<()> {
        println!("  -> dialog {}", dialog.as_str());
        Ok(())
    }

    fn type_text(&self, target_id: &str, text: &str) -> anyhow::Result<()> {
        println!("  -> type {:?} into #{}", text, target_id);
        Ok(())
    }

    fn quiz_answer(&self, params: &Params) -> anyhow::Result<()> {
        anyhow::bail!("no quiz on screen (params {})", serde_params(params))
    }

    fn arcade(&self, command: ArcadeCommand, params: &Params) -> anyhow::Result<()> {
        anyhow::bail!("arcade is not open ({:?} {})", command, serde_params(params))
    }

    fn logout(&self) -> anyhow::Result<()> {
        println!("  -> logged out");
        Ok(())
    }
}

fn serde_params(params: &Params) -> String {
    params
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Prints utterances. Playback "finishes" when the caller drains it.
pub struct ConsoleSpeech {
    audible: Arc<Mutex<Option<u64>>>,
}

#[derive(Clone)]
pub struct ConsoleSpeechHandle {
    audible: Arc<Mutex<Option<u64>>>,
}

impl ConsoleSpeech {
    pub fn new() -> (Self, ConsoleSpeechHandle) {
        let audible = Arc::new(Mutex::new(None));
        (
            Self {
                audible: audible.clone(),
            },
            ConsoleSpeechHandle { audible },
        )
    }
}

impl ConsoleSpeechHandle {
    /// Id of the utterance playing right now, marking it finished.
    pub fn finish(&self) -> Option<u64> {
        lock(&self.audible).take()
    }
}

impl SpeechOutput for ConsoleSpeech {
    fn speak(&mut self, utterance: &Utterance) -> Result<(), SpeechError> {
        if utterance.text.trim().is_empty() {
            return Err(SpeechError::EmptyText);
        }
        match &utterance.voice {
            Some(voice) => println!("  [speak:{}] {}", voice, utterance.text),
            None => println!("  [speak] {}", utterance.text),
        }
        *lock(&self.audible) = Some(utterance.id);
        Ok(())
    }

    fn cancel(&mut self) {
        if lock(&self.audible).take().is_some() {
            println!("  [speech interrupted]");
        }
    }
}
