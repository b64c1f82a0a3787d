use clap::Parser;

use careerqa::Args;

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    let args = Args::parse();
    careerqa::run(args)
}
