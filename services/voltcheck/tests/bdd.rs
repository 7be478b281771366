//! BDD test entry point for voltcheck

#[path = "bdd/world.rs"]
mod world;

#[path = "bdd/steps/mod.rs"]
mod steps;

use cucumber::World as _;
use world::VoltcheckWorld;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    VoltcheckWorld::run("tests/features").await;
}
