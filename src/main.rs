use clap::Parser;
use env_logger::Env;
use gaussian_beam::{
    console::{report, Args, PartialArgs},
    error::BeamResult,
};

fn main() -> BeamResult<()> {
    env_logger::init_from_env(Env::default().default_filter_or("info"));
    //parse CLI arguments and build the bench
    let args = Args::try_from(PartialArgs::parse())?;

    print!("{}", report(&args.bench, &args.positions)?);
    Ok(())
}
