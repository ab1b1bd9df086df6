use std::env;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use branch_fic::engine::{Output, OutputBlock, Prompt, Reply, Session};
use branch_fic::story::{Story, load_story_from_file, load_story_from_str};

/// Story shipped with the binary; content changes require recompilation.
const BUILTIN_STORY: &str = include_str!("../stories/mansion.toml");

fn flush_output(out: Output) {
    let mut printed_anything = false;
    let mut started_events = false;

    for block in out.blocks {
        match block {
            OutputBlock::Text(text) => {
                if printed_anything {
                    println!();
                }
                println!("{}", text);
                printed_anything = true;
                started_events = false;
            }
            OutputBlock::Event(ev) => {
                if !started_events {
                    if printed_anything {
                        println!(); // visual separation before first event
                    }
                    started_events = true;
                }
                println!("* {}", ev);
                printed_anything = true;
            }
        }
    }
}

fn load_story() -> Story {
    match env::args().nth(1).map(PathBuf::from) {
        Some(path) => match load_story_from_file(&path) {
            Ok(story) => {
                println!("Using story file: {}", path.display());
                story
            }
            Err(e) => {
                eprintln!("Failed to load story file '{}': {e}", path.display());
                std::process::exit(1);
            }
        },
        None => match load_story_from_str(BUILTIN_STORY) {
            Ok(story) => story,
            Err(e) => {
                eprintln!("Built-in story is broken: {e}");
                std::process::exit(1);
            }
        },
    }
}

/// Reads one line; `None` means the input channel closed (EOF), which is
/// how the player backs out of a prompt.
fn read_line(stdin: &io::Stdin) -> io::Result<Option<String>> {
    print!("> ");
    io::stdout().flush()?;
    let mut line = String::new();
    let bytes_read = stdin.lock().read_line(&mut line)?;
    if bytes_read == 0 {
        println!();
        return Ok(None);
    }
    Ok(Some(line.trim_end_matches(['\n', '\r']).to_string()))
}

fn read_reply(stdin: &io::Stdin, prompt: &Prompt) -> io::Result<Reply> {
    match prompt {
        Prompt::Choice { text, options } => {
            println!("\n{}", text);
            for (i, label) in options.iter().enumerate() {
                println!("  {}) {}", i + 1, label);
            }
            loop {
                let Some(line) = read_line(stdin)? else {
                    return Ok(Reply::Cancelled);
                };
                let line = line.trim();
                if line.eq_ignore_ascii_case("back") || line.eq_ignore_ascii_case("b") {
                    return Ok(Reply::Cancelled);
                }
                match line.parse::<usize>() {
                    // 1-based at the prompt, 0-based on the wire. Out-of-range
                    // numbers are passed through; the engine answers them.
                    Ok(n) if n > 0 => return Ok(Reply::Choice(n - 1)),
                    _ => println!("Please enter the number of your choice (or 'back')."),
                }
            }
        }
        Prompt::Answer { text } => {
            println!("\n{}", text);
            match read_line(stdin)? {
                Some(line) => Ok(Reply::Text(line)),
                None => Ok(Reply::Cancelled),
            }
        }
        Prompt::Confirm { text } => {
            println!("\n{} (y/n)", text);
            match read_line(stdin)? {
                Some(line) => {
                    let line = line.trim();
                    if line.eq_ignore_ascii_case("y") || line.eq_ignore_ascii_case("yes") {
                        Ok(Reply::Yes)
                    } else {
                        Ok(Reply::No)
                    }
                }
                None => Ok(Reply::Cancelled),
            }
        }
    }
}

fn main() -> io::Result<()> {
    let story = load_story();

    println!("Welcome to {}!", story.title);
    if !story.desc.trim().is_empty() {
        println!("{}", story.desc.trim());
    }
    println!();

    let stdin = io::stdin();

    println!("Before we begin, what is your name?");
    let name = read_line(&stdin)?.unwrap_or_default();

    let mut session = Session::new(story, &name);
    let mut turn = session.start();

    loop {
        flush_output(turn.output);
        let Some(prompt) = turn.prompt else {
            break;
        };
        let reply = read_reply(&stdin, &prompt)?;
        turn = session.step(reply);
    }

    Ok(())
}
