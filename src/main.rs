// Copyright 2022-2023 VMware, Inc.
// SPDX-License-Identifier: BSD-2-Clause

use std::process;

use clap::Parser;
use codespan_reporting::{
    diagnostic::{Diagnostic, Label},
    files::SimpleFile,
    term::{
        self as terminal,
        termcolor::{ColorChoice, StandardStream},
    },
};
use protosmt::scan;
use protosmt::smtlib::interp::Interp;

#[derive(clap::ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
enum ColorOutput {
    Never,
    Auto,
    Always,
}

#[derive(clap::Parser, Debug)]
#[command(about, long_about = None)]
struct Args {
    #[arg(value_enum, long, default_value_t = ColorOutput::Auto)]
    /// Control color output. Auto disables colors with TERM=dumb or
    /// NO_COLOR=true.
    color: ColorOutput,

    /// SMT-LIB script files, executed in order against one session
    #[arg(required = true)]
    files: Vec<String>,
}

fn main() {
    pretty_env_logger::init();
    let args = Args::parse();

    let writer = StandardStream::stderr(match args.color {
        ColorOutput::Never => ColorChoice::Never,
        ColorOutput::Always => ColorChoice::Always,
        ColorOutput::Auto => ColorChoice::Auto,
    });
    let config = codespan_reporting::term::Config {
        start_context_lines: 3,
        end_context_lines: 3,
        ..Default::default()
    };

    let mut interp = Interp::new();
    for path in &args.files {
        match scan::load(path) {
            Ok(pos) => interp.execute(pos),
            Err(err) => {
                eprintln!("{err}");
                process::exit(1);
            }
        }
    }

    for line in interp.output() {
        println!("{line}");
    }

    if !interp.messages().is_empty() {
        for message in interp.messages().iter() {
            let source = message.position.file();
            let files = SimpleFile::new(&source.name, &source.text);
            let start = message.position.offset();
            let end = match message.position.ch() {
                Some(c) => start + c.len_utf8(),
                None => start,
            };
            let diagnostic = Diagnostic::error()
                .with_message(message.description.clone())
                .with_labels(vec![Label::primary((), start..end)]);
            terminal::emit(&mut writer.lock(), &config, &files, &diagnostic).unwrap();
        }
        process::exit(1);
    }
}
