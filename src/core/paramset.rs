//! Bundle up parameters and their values in a generic way.
//!
//! Options of the patch intersector are read from a **ParamSet** by
//! name, falling back to a default when a name is missing. Every item
//! remembers whether it was looked up so that misspelled or unsupported
//! parameters can be reported afterwards.

// std
use std::cell::Cell;
// subdiv
use crate::core::common::Float;
use crate::core::error::{Result, SubdivError};

pub struct ParamSetItem<T> {
    pub name: String,
    pub values: Vec<T>,
    pub n_values: usize,
    pub looked_up: Cell<bool>, // false
}

impl<T> ParamSetItem<T> {
    fn new(name: String, values: Vec<T>) -> Self {
        let n_values: usize = values.len();
        ParamSetItem {
            name,
            values,
            n_values,
            looked_up: Cell::new(false),
        }
    }
}

#[derive(Default)]
pub struct ParamSet {
    pub bools: Vec<ParamSetItem<bool>>,
    pub ints: Vec<ParamSetItem<i32>>,
    pub floats: Vec<ParamSetItem<Float>>,
    pub strings: Vec<ParamSetItem<String>>,
}

impl ParamSet {
    pub fn add_float(&mut self, name: String, value: Float) {
        self.floats.push(ParamSetItem::new(name, vec![value]));
    }
    pub fn add_int(&mut self, name: String, value: i32) {
        self.ints.push(ParamSetItem::new(name, vec![value]));
    }
    pub fn add_bool(&mut self, name: String, value: bool) {
        self.bools.push(ParamSetItem::new(name, vec![value]));
    }
    pub fn add_string(&mut self, name: String, value: String) {
        self.strings.push(ParamSetItem::new(name, vec![value]));
    }
    /// Parses a `name=value` pair and stores it with the narrowest type
    /// that accepts the value: bool (`true`/`false`), int, float, and
    /// string otherwise.
    pub fn add_parsed(&mut self, pair: &str) -> Result<()> {
        let mut split = pair.splitn(2, '=');
        let name: &str = split.next().unwrap_or("").trim();
        let value: &str = match split.next() {
            Some(v) => v.trim(),
            None => return Err(SubdivError::Parameter(pair.to_string())),
        };
        if name.is_empty() || value.is_empty() {
            return Err(SubdivError::Parameter(pair.to_string()));
        }
        if let Ok(b) = value.parse::<bool>() {
            self.add_bool(name.to_string(), b);
        } else if let Ok(i) = value.parse::<i32>() {
            self.add_int(name.to_string(), i);
        } else if let Ok(f) = value.parse::<Float>() {
            self.add_float(name.to_string(), f);
        } else {
            self.add_string(name.to_string(), value.to_string());
        }
        Ok(())
    }
    pub fn find_one_float(&self, name: &str, d: Float) -> Float {
        for v in &self.floats {
            if v.name == name && v.n_values == 1 {
                v.looked_up.set(true);
                return v.values[0];
            }
        }
        // integers are accepted where a float is expected
        for v in &self.ints {
            if v.name == name && v.n_values == 1 {
                v.looked_up.set(true);
                return v.values[0] as Float;
            }
        }
        d
    }
    pub fn find_one_int(&self, name: &str, d: i32) -> i32 {
        lookup_one(&self.ints, name, d)
    }
    pub fn find_one_bool(&self, name: &str, d: bool) -> bool {
        lookup_one(&self.bools, name, d)
    }
    pub fn find_one_string(&self, name: &str, d: String) -> String {
        lookup_one(&self.strings, name, d)
    }
    /// Names of all parameters nobody asked for.
    pub fn unused(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        collect_unused(&self.bools, &mut names);
        collect_unused(&self.ints, &mut names);
        collect_unused(&self.floats, &mut names);
        collect_unused(&self.strings, &mut names);
        names
    }
    /// Logs a warning for every parameter nobody asked for.
    pub fn report_unused(&self) {
        for name in self.unused() {
            warn!("parameter {:?} unused", name);
        }
    }
}

/// Returns the single value stored under *name* (marking it as used)
/// or the default *d*.
pub fn lookup_one<T>(vec: &[ParamSetItem<T>], name: &str, d: T) -> T
where
    T: Clone,
{
    for v in vec {
        if v.name == name && v.n_values == 1_usize {
            v.looked_up.set(true);
            return v.values[0].clone();
        }
    }
    d
}

fn collect_unused<T>(vec: &[ParamSetItem<T>], names: &mut Vec<String>) {
    for v in vec {
        if !v.looked_up.get() {
            names.push(v.name.clone());
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parsed_values_get_their_type() {
        let mut ps: ParamSet = ParamSet::default();
        ps.add_parsed("subdivlevel=3").unwrap();
        ps.add_parsed("backfaceculling = true").unwrap();
        ps.add_parsed("strategy=cached").unwrap();
        ps.add_parsed("scale=0.5").unwrap();
        assert_eq!(ps.find_one_int("subdivlevel", 0), 3);
        assert!(ps.find_one_bool("backfaceculling", false));
        assert_eq!(ps.find_one_string("strategy", String::new()), "cached");
        assert_eq!(ps.find_one_float("scale", 1.0), 0.5);
        assert!(ps.unused().is_empty());
    }

    #[test]
    fn malformed_pairs_are_rejected() {
        let mut ps: ParamSet = ParamSet::default();
        assert_eq!(
            ps.add_parsed("subdivlevel"),
            Err(SubdivError::Parameter("subdivlevel".to_string()))
        );
        assert!(ps.add_parsed("=3").is_err());
        assert!(ps.add_parsed("level=").is_err());
    }

    #[test]
    fn missing_names_fall_back_and_leftovers_are_unused() {
        let mut ps: ParamSet = ParamSet::default();
        ps.add_int("cachesets".to_string(), 64);
        ps.add_int("typo".to_string(), 1);
        assert_eq!(ps.find_one_int("cachesets", 8), 64);
        assert_eq!(ps.find_one_int("cacheways", 4), 4);
        assert_eq!(ps.find_one_float("cachesets", 0.0), 64.0);
        assert_eq!(ps.unused(), vec!["typo".to_string()]);
    }
}
