// Copyright (c) The gossamer Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use gossamer::{Color, ExpectedError, GossamerApp};
use gossamer_runner::config::RunnerLayout;

fn main() {
    let styles = Color::from_env().stderr_styles();

    let app = GossamerApp::parse_or_exit(&styles);

    let layout = match RunnerLayout::from_env() {
        Ok(layout) => layout,
        Err(err) => {
            let error = ExpectedError::from(err);
            error.display_to_stderr(&styles);
            std::process::exit(error.process_exit_code());
        }
    };

    let mut stdout = std::io::stdout();
    let mut stderr = std::io::stderr();
    let mut stdin = std::io::stdin().lock();

    match app.exec(layout, &mut stdout, &mut stderr, &mut stdin) {
        Ok(code) => std::process::exit(code),
        Err(error) => {
            error.display_to_stderr(&styles);
            std::process::exit(error.process_exit_code());
        }
    }
}
