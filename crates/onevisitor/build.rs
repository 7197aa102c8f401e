// Renders man pages for `onevisitor` and every visible subcommand into
// `$OUT_DIR/man`. `src/cli.rs` is included by path, so it must stay free of
// anything beyond clap and clap_complete.

use std::fs;
use std::path::Path;

use clap::CommandFactory;

#[path = "src/cli.rs"]
mod cli;

fn main() {
    println!("cargo::rerun-if-changed=src/cli.rs");

    let Some(out_dir) = std::env::var_os("OUT_DIR") else {
        panic!("OUT_DIR not set by Cargo");
    };
    let man_dir = Path::new(&out_dir).join("man");
    if let Err(e) = fs::create_dir_all(&man_dir) {
        panic!("cannot create {}: {e}", man_dir.display());
    }

    render_tree(cli::Cli::command(), &man_dir);
}

/// Write `<prefix>.1` for `cmd`, then recurse with `<prefix>-<sub>` names.
fn render_tree(cmd: clap::Command, dir: &Path) {
    let page_name = cmd.get_name().to_owned();
    let mut page = Vec::new();
    if let Err(e) = clap_mangen::Man::new(cmd.clone()).render(&mut page) {
        panic!("rendering {page_name}.1: {e}");
    }
    let target = dir.join(format!("{page_name}.1"));
    if let Err(e) = fs::write(&target, page) {
        panic!("writing {}: {e}", target.display());
    }

    let visible: Vec<clap::Command> = cmd
        .get_subcommands()
        .filter(|sub| !sub.is_hide_set())
        .cloned()
        .collect();
    for sub in visible {
        let renamed = format!("{page_name}-{}", sub.get_name());
        render_tree(sub.name(renamed), dir);
    }
}
