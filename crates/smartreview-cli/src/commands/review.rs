use std::sync::Arc;

use smartreview_core::{
    Config, DesktopHost, ReviewBlock, ReviewInlineController, ReviewPrompter, ReviewSnapshot,
    ReviewUiAction, ReviewUiState, SmartReview, SqliteStore,
};

use super::CommandResult;

struct Session {
    config: Config,
    prompter: Arc<SmartReview>,
}

impl Session {
    fn open() -> Result<Self, Box<dyn std::error::Error>> {
        let config = Config::load()?;
        let store = Arc::new(SqliteStore::open_default()?);
        let prompter = Arc::new(SmartReview::new(store, config.review_config()));
        Ok(Self { config, prompter })
    }

    fn controller(&self) -> ReviewInlineController {
        ReviewInlineController::new(self.prompter.clone())
    }

    fn print_block(&self, block: Option<ReviewBlock>) {
        match block {
            Some(block) => print!("{}", render(&block)),
            None => println!("(hidden)"),
        }
    }
}

fn render(block: &ReviewBlock) -> String {
    let buttons: Vec<String> = block
        .buttons
        .iter()
        .map(|b| format!("[{}] ({})", b.label, b.action))
        .collect();
    format!("{}\n  {}\n", block.title, buttons.join("  "))
}

fn print_snapshot(snapshot: &ReviewSnapshot) {
    let stamp = |at: Option<chrono::DateTime<chrono::Utc>>| {
        at.map(|t| t.to_rfc3339()).unwrap_or_else(|| "-".into())
    };
    let sentiment = match snapshot.sentiment_positive {
        Some(true) => "positive",
        Some(false) => "negative",
        None => "-",
    };

    println!("first_launch_at:     {}", stamp(snapshot.first_launch_at));
    println!("launch_count:        {}", snapshot.launch_count);
    println!("last_prompt_at:      {}", stamp(snapshot.last_prompt_at));
    println!("prompt_count:        {}", snapshot.prompt_count);
    println!("passive_shown_count: {}", snapshot.passive_shown_count);
    println!("opt_out:             {}", snapshot.opt_out);
    println!("sentiment:           {sentiment}");
}

pub async fn launch() -> CommandResult {
    let session = Session::open()?;
    session.prompter.on_app_launched().await?;
    println!("will_show_review: {}", session.prompter.will_show_review().get());
    Ok(())
}

pub async fn status(json: bool) -> CommandResult {
    let session = Session::open()?;
    let snapshot = session.prompter.snapshot().await?;
    let decision = session.prompter.decide().await?;

    if json {
        let out = serde_json::json!({
            "snapshot": snapshot,
            "decision": decision,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    print_snapshot(&snapshot);
    match decision.veto() {
        None => println!("decision:            eligible"),
        Some(veto) => println!("decision:            ineligible ({veto})"),
    }
    Ok(())
}

pub async fn show() -> CommandResult {
    let session = Session::open()?;
    let controller = session.controller();
    controller.evaluate().await?;
    session.print_block(controller.block(&session.config.strings, &session.config.style));
    Ok(())
}

pub async fn act(action: ReviewUiAction) -> CommandResult {
    let session = Session::open()?;
    let controller = session.controller();

    match controller.submit(action, &DesktopHost).await? {
        Some(true) => println!("review flow completed"),
        Some(false) => println!("review flow did not complete"),
        None => println!("ok"),
    }

    // Each invocation starts hidden, so the follow-up step is drawn directly.
    if action == ReviewUiAction::Like {
        session.print_block(ReviewBlock::build(
            ReviewUiState::Visible,
            controller.step().get(),
            &session.config.strings,
            &session.config.style,
        ));
    }
    Ok(())
}
