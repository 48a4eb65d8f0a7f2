fn main() {
    if let Err(e) = rotation_gate_lib::run() {
        eprintln!("rotation-gate: {:#}", e);
        std::process::exit(1);
    }
}
