use blueprint::EditorError;
use blueprint::run;

fn main() -> Result<(), EditorError> {
    env_logger::init();
    run(std::env::args().collect())
}
