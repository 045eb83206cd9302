/// Skip a test if the openssl binary is not on PATH.
#[macro_export]
macro_rules! skip_without_openssl {
    () => {
        if std::process::Command::new("openssl")
            .arg("version")
            .output()
            .map(|o| !o.status.success())
            .unwrap_or(true)
        {
            eprintln!("SKIPPED: openssl not found on PATH");
            return;
        }
    };
}
