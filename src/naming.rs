use crate::value::TypeDesc;

/// Picks the name of a mock created without one.
pub trait NamingScheme: Send + Sync {
    fn default_name_for(&self, ty: &TypeDesc) -> String;
}

/// Names a mock after its type with the first letter lowercased:
/// `Arc<dyn TurtleDriver>` becomes `turtleDriver`.
#[derive(Debug, Default, Clone, Copy)]
pub struct CamelCaseNamingScheme;

impl NamingScheme for CamelCaseNamingScheme {
    fn default_name_for(&self, ty: &TypeDesc) -> String {
        camel_case(simple_name(ty.name()))
    }
}

// "alloc::sync::Arc<dyn my::Repo<my::Item> + Send>" => "Repo"
fn simple_name(full: &str) -> &str {
    let inner = match (full.find('<'), full.rfind('>')) {
        (Some(open), Some(close)) if open < close && full[..open].ends_with("Arc") => {
            &full[open + 1..close]
        }
        _ => full,
    };

    let inner = inner.trim_start_matches("dyn ");
    let inner = inner.split(" + ").next().unwrap_or(inner);
    let inner = inner.split('<').next().unwrap_or(inner);
    inner.rsplit("::").next().unwrap_or(inner)
}

fn camel_case(simple: &str) -> String {
    let mut chars = simple.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::value::Arg;

    #[test]
    fn strips_paths_and_arcs() {
        assert_eq!(simple_name("alloc::sync::Arc<dyn my::Turtle>"), "Turtle");
        assert_eq!(simple_name("alloc::sync::Arc<dyn my::Repo<my::Item> + Send>"), "Repo");
        assert_eq!(simple_name("alloc::string::String"), "String");
    }

    #[test]
    fn lowercases_first_letter() {
        let name = CamelCaseNamingScheme.default_name_for(&<Arc<str>>::type_desc());
        assert_eq!(name, "str");
        assert_eq!(camel_case("TurtleDriver"), "turtleDriver");
    }
}
