fn main() -> std::process::ExitCode {
    vault_cli::exit_code(vault_cli::execute_from_env())
}
