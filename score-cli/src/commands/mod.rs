pub mod extract;
pub mod prove;
pub mod score;
pub mod verify;
pub mod witness;

#[derive(Debug, clap::Subcommand)]
pub enum Command {
    /// Extract a feature vector from a raw feature record
    Extract(extract::Extract),
    /// Score a feature vector with the circuit-parallel engine
    Score(score::Score),
    /// Build a circuit witness from a feature vector
    Witness(witness::Witness),
    /// Generate a Groth16 proof from a witness
    Prove(prove::Prove),
    /// Verify a Groth16 proof
    Verify(verify::Verify),
}

impl Command {
    pub async fn run(self) -> anyhow::Result<()> {
        match self {
            Command::Extract(cmd) => cmd.run(),
            Command::Score(cmd) => cmd.run(),
            Command::Witness(cmd) => cmd.run(),
            Command::Prove(cmd) => cmd.run().await,
            Command::Verify(cmd) => cmd.run().await,
        }
    }
}
