use libmbcursor::config::{Config, ReportFormat};
use libmbcursor::core::MbContext;
use libmbcursor::report::LineReport;
use std::io::{self, BufRead, Write};

fn main() -> io::Result<()> {
    env_logger::init();

    let config = Config::load();
    let format = match std::env::args().nth(1).as_deref() {
        Some("--json") => ReportFormat::Json,
        Some("--text") => ReportFormat::Text,
        _ => config.report.format,
    };
    let mut ctx = MbContext::from_config(&config);

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut out = stdout.lock();
    for (i, line) in stdin.lock().split(b'\n').enumerate() {
        let mut line = line?;
        if line.last() == Some(&b'\r') {
            line.pop();
        }
        LineReport::build(&mut ctx, i + 1, &line).write(&mut out, format)?;
    }
    out.flush()?;
    log::debug!("width cache: {:?}", ctx.widths());
    Ok(())
}
