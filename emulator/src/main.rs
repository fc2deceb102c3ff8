#[allow(dead_code)]
mod bench;
#[allow(dead_code)]
mod session;

use std::env;
use std::io::{self, Write};
use std::process;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::style::Print;
use crossterm::terminal::{self, ClearType};
use crossterm::{cursor, execute, queue};
use supply_core::config::ControllerConfig;
use supply_core::hal::ButtonId;

use session::{Action, Session, describe};

const USAGE: &str = "Usage: supply-emulator [--tick-ms <n>] [--debounce <n>]";

const KEY_HELP: &str = "up/u: UP  down/d: DOWN  enter/s: SELECT  a/A b/B: load +/-  1-4: aux  q: quit";

fn main() -> io::Result<()> {
    let config = parse_config(env::args().skip(1)).unwrap_or_else(|err| {
        eprintln!("{err}");
        eprintln!("{USAGE}");
        process::exit(2);
    });

    let mut session = Session::new(config);
    session.bench().state_mut().realtime = true;

    terminal::enable_raw_mode()?;
    let outcome = run(&mut session, config);
    terminal::disable_raw_mode()?;
    println!();
    outcome
}

fn run(session: &mut Session, config: ControllerConfig) -> io::Result<()> {
    let mut stdout = io::stdout();
    let mut log: Vec<String> = Vec::new();
    let step = config.scan_period.max(Duration::from_millis(1));

    execute!(stdout, terminal::Clear(ClearType::All), cursor::Hide)?;
    loop {
        draw(&mut stdout, session, &log)?;

        let summary = if event::poll(step)? {
            match event::read()? {
                Event::Key(key) if key.kind != KeyEventKind::Release => match action_for(key) {
                    Some(Input::Quit) => break,
                    Some(Input::Act(action)) => session.apply(action),
                    None => continue,
                },
                _ => continue,
            }
        } else {
            session.step()
        };

        log.extend(describe(&summary));
        let keep = log.len().saturating_sub(6);
        log.drain(..keep);
    }
    execute!(stdout, cursor::Show)
}

enum Input {
    Quit,
    Act(Action),
}

fn action_for(key: KeyEvent) -> Option<Input> {
    let action = match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            return Some(Input::Quit);
        }
        KeyCode::Char('q') | KeyCode::Esc => return Some(Input::Quit),
        KeyCode::Up => Action::Press(ButtonId::Up),
        KeyCode::Down => Action::Press(ButtonId::Down),
        KeyCode::Enter => Action::Press(ButtonId::Select),
        KeyCode::Char(c) => Action::from_key(c)?,
        _ => return None,
    };
    Some(Input::Act(action))
}

fn draw(out: &mut impl Write, session: &Session, log: &[String]) -> io::Result<()> {
    let state = session.bench().state();
    let border = format!("+{}+", "-".repeat(16));
    let [top, bottom] = state.lcd.frame();

    queue!(
        out,
        cursor::MoveTo(0, 0),
        terminal::Clear(ClearType::FromCursorDown),
        Print(format!("Bench Supply Emulator  t={:.1}s", session.elapsed().as_secs_f32())),
        cursor::MoveTo(0, 2),
        Print(&border),
        cursor::MoveTo(0, 3),
        Print(format!("|{top}|")),
        cursor::MoveTo(0, 4),
        Print(format!("|{bottom}|")),
        cursor::MoveTo(0, 5),
        Print(&border),
        cursor::MoveTo(0, 7),
        Print(format!(
            "load A:{}ma B:{}ma  aux {:?}mv  shutdown A:{} B:{}  status:{}",
            state.load_ma[0],
            state.load_ma[1],
            state.aux_mv,
            on_off(state.shutdown[0]),
            on_off(state.shutdown[1]),
            on_off(state.status),
        )),
        cursor::MoveTo(0, 8),
        Print(KEY_HELP),
    )?;
    for (row, line) in (10u16..).zip(log) {
        queue!(out, cursor::MoveTo(0, row), Print(line))?;
    }
    out.flush()
}

fn on_off(asserted: bool) -> &'static str {
    if asserted { "on" } else { "off" }
}

fn parse_config<I>(mut args: I) -> Result<ControllerConfig, String>
where
    I: Iterator<Item = String>,
{
    let mut config = ControllerConfig::DEFAULT;
    while let Some(arg) = args.next() {
        let (flag, inline) = match arg.split_once('=') {
            Some((flag, value)) => (flag.to_string(), Some(value.to_string())),
            None => (arg, None),
        };
        let value = match inline.or_else(|| args.next()) {
            Some(value) => value,
            None => return Err(format!("Expected value after {flag}")),
        };
        match flag.as_str() {
            "--tick-ms" => {
                let millis: u64 = parse_number(&flag, &value)?;
                if millis == 0 {
                    return Err("--tick-ms must be at least 1".to_string());
                }
                config = config.with_tick_period(Duration::from_millis(millis));
            }
            "--debounce" => {
                config = config.with_debounce_samples(parse_number(&flag, &value)?);
            }
            _ => return Err(format!("Unknown option `{flag}`")),
        }
    }
    Ok(config)
}

fn parse_number<T: std::str::FromStr>(flag: &str, value: &str) -> Result<T, String> {
    value
        .parse()
        .map_err(|_| format!("Invalid value `{value}` for {flag}"))
}
