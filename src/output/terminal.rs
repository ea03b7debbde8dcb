//! Terminal output for sample progress.

use colored::Colorize;

/// Announce a step, e.g. `Creating resource group 'rg1'...`.
pub fn step(msg: &str) {
    log::info!("{msg}");
    println!("{msg}");
}

pub fn success(msg: &str) {
    log::info!("{msg}");
    println!("{}", msg.green());
}

/// Print a failed step and keep going.
pub fn failure(msg: &str) {
    log::error!("{msg}");
    println!("{}", msg.red());
}

/// Join names the way the samples list resources: `a, b, `.
pub fn format_names<I, S>(names: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    names
        .into_iter()
        .map(|n| format!("{}, ", n.as_ref()))
        .collect()
}

pub fn print_names<I, S>(names: I)
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    println!("{}", format_names(names));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_names() {
        assert_eq!(format_names(["rg1", "rg2"]), "rg1, rg2, ");
    }

    #[test]
    fn test_format_names_empty() {
        assert_eq!(format_names(Vec::<String>::new()), "");
    }
}
