use alloc::string::String;

/// Strips module paths from every path segment of a type name
pub(crate) fn format_type_name(name: &str) -> String {
    let mut result = String::with_capacity(name.len());
    let mut segment_start = 0;
    let mut chars = name.chars().peekable();

    while let Some(char) = chars.next() {
        match char {
            ':' if chars.peek() == Some(&':') => {
                chars.next();
                result.truncate(segment_start);
            }
            '<' | '>' | ',' | ' ' | '(' | ')' | '[' | ']' | '&' | ';' | '*' => {
                result.push(char);
                segment_start = result.len();
            }
            _ => result.push(char),
        }
    }

    result
}
