use std::env;
use std::ffi::OsString;
use std::process;

use stackcc::CompileError;
use tracing::debug;
use tracing_subscriber::EnvFilter;

fn main() {
  tracing_subscriber::fmt()
    .with_writer(std::io::stderr)
    .with_env_filter(
      EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    )
    .init();

  let args: Vec<OsString> = env::args_os().collect();
  let [_, expr] = args.as_slice() else {
    let program = args
      .first()
      .map(|name| name.to_string_lossy().into_owned())
      .unwrap_or_else(|| "stackcc".to_string());
    eprintln!("usage: {program} <expr>");
    process::exit(1);
  };

  // Bytes that are not UTF-8 become U+FFFD, which the tokenizer rejects at
  // its offset like any other unknown character.
  let expr = expr.to_string_lossy();
  debug!(len = expr.len(), "compiling argument");

  match stackcc::generate_assembly(&expr) {
    Ok(asm) => print!("{asm}"),
    Err(err) => report(&err),
  }
}

/// Print a diagnostic and stop: the first error ends the compilation.
fn report(err: &CompileError) -> ! {
  eprintln!("{err}");
  process::exit(1);
}
