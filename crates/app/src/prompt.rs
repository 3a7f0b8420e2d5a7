use std::io::{self, BufRead, Write};

use common::credential::Prompt;

/// Approval hook for the local credential provider
///
/// Asks on the terminal unless `auto_approve` is set. Anything but an
/// explicit yes is a rejection. The provider runs it on a blocking thread.
pub fn terminal_approval(auto_approve: bool) -> impl Fn(&Prompt) -> bool + Send + Sync + 'static {
    move |prompt: &Prompt| {
        if auto_approve {
            return true;
        }
        let question = match prompt {
            Prompt::PublicKey { owner } => format!("Allow access to the encryption key of {owner}?"),
            Prompt::Decrypt { owner } => format!("Decrypt a document key for {owner}?"),
        };
        ask(&question)
    }
}

fn ask(question: &str) -> bool {
    let mut stderr = io::stderr();
    if write!(stderr, "{question} [y/N] ").and_then(|_| stderr.flush()).is_err() {
        return false;
    }
    let mut answer = String::new();
    if io::stdin().lock().read_line(&mut answer).is_err() {
        return false;
    }
    is_yes(&answer)
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}
