use crate::descriptor::FormatDescriptor;
use std::collections::HashMap;

/// Raw captures of one matched line, borrowed from the descriptor and the line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureSet<'a> {
    groups: HashMap<&'a str, Option<&'a str>>,
}

impl<'a> CaptureSet<'a> {
    /// Raw value of a group, `None` when the group did not participate
    pub fn get(&self, name: &str) -> Option<&'a str> {
        self.groups.get(name).copied().flatten()
    }
}

/// Apply the descriptor's whole-line pattern. `None` is the no-match signal.
///
/// One trailing newline is ignored, so lines read with their terminator still match.
pub fn match_line<'a>(descriptor: &'a FormatDescriptor, line: &'a str) -> Option<CaptureSet<'a>> {
    let line = line.strip_suffix('\n').unwrap_or(line);
    let regex = descriptor.regex();
    let captures = regex.captures(line)?;

    let groups = regex
        .capture_names()
        .flatten()
        .map(|name| (name, captures.name(name).map(|m| m.as_str())))
        .collect();

    Some(CaptureSet { groups })
}
