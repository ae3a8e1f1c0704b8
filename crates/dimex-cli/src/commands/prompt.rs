//! Prompt command implementation.

use crate::cli::PromptArgs;
use crate::config::Config;
use crate::error::Result;

/// Execute the prompt command.
pub fn execute_prompt(args: PromptArgs, config: &Config) -> Result<()> {
    println!("{}", prompt_text(&args, config));
    Ok(())
}

fn prompt_text<'a>(args: &PromptArgs, config: &'a Config) -> &'a str {
    if args.evaluator {
        config.pipeline.effective_evaluator_prompt()
    } else {
        config.pipeline.effective_system_prompt()
    }
}
