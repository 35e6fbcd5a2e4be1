mod audio;
mod catalog;
mod config;
mod engine;
mod mpris;
mod now_playing;
mod platform;
mod runtime;

#[cfg(test)]
mod test_support;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    runtime::run()
}
