//! Runs a key script against the emulator and prints every LCD frame that
//! differs from the previous one.
//!
//! `replay "w s d u s u w"` walks the current-limit editor; see
//! [`Action::from_key`] for the key set. With no argument the script is
//! read from stdin.

use std::env;
use std::io::{self, Read, Write};
use std::process;

#[allow(dead_code)]
#[path = "../bench.rs"]
mod bench;

#[allow(dead_code)]
#[path = "../session.rs"]
mod session;

use supply_core::config::ControllerConfig;

use session::{Action, Session, describe, parse_script};

fn main() -> io::Result<()> {
    let script = match env::args().nth(1) {
        Some(script) => script,
        None => {
            let mut script = String::new();
            io::stdin().read_to_string(&mut script)?;
            script
        }
    };
    let actions = parse_script(&script).unwrap_or_else(|err| {
        eprintln!("{err}");
        process::exit(2);
    });

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut session = Session::new(ControllerConfig::DEFAULT);
    let mut shown = session.frame();
    write_frame(&mut out, &session, "start", &shown)?;

    for action in actions {
        let summary = session.apply(action);
        for line in describe(&summary) {
            writeln!(out, "  {line}")?;
        }
        let frame = session.frame();
        if frame != shown {
            write_frame(&mut out, &session, &label(action), &frame)?;
            shown = frame;
        }
    }
    Ok(())
}

fn label(action: Action) -> String {
    match action {
        Action::Press(button) => format!("press {button:?}"),
        Action::Wait(duration) => format!("wait {}ms", duration.as_millis()),
        Action::Load(supply, delta) => format!("load {} {delta:+}ma", supply.label()),
        Action::Aux(channel) => format!("aux {}", channel + 1),
    }
}

fn write_frame(
    out: &mut impl Write,
    session: &Session,
    label: &str,
    frame: &[String],
) -> io::Result<()> {
    let border = format!("+{}+", "-".repeat(16));
    writeln!(out, "[{:>7}ms] {label}", session.elapsed().as_millis())?;
    writeln!(out, "{border}")?;
    for line in frame {
        writeln!(out, "|{line}|")?;
    }
    writeln!(out, "{border}")
}
