use logger_proc_macro::log;

#[derive(Debug, PartialEq)]
enum ParseFailure {
    Empty,
    NotANumber,
}

impl From<std::num::ParseIntError> for ParseFailure {
    fn from(_err: std::num::ParseIntError) -> Self {
        ParseFailure::NotANumber
    }
}

#[log(trace)]
fn parse_port(raw: &str) -> Result<u16, ParseFailure> {
    if raw.is_empty() {
        return Err(ParseFailure::Empty);
    }
    let port = raw.trim().parse::<u16>()?;
    Ok(port)
}

#[log(debug)]
fn no_arguments() {}

struct Counter {
    value: u32,
}

impl Counter {
    #[log(trace)]
    fn bump(&mut self, by: u32) -> u32 {
        self.value += by;
        self.value
    }

    #[log(debug)]
    async fn bump_async(&mut self, by: u32) -> Result<u32, ParseFailure> {
        let parsed = parse_port(&by.to_string())?;
        self.value += parsed as u32;
        Ok(self.value)
    }
}

#[test]
fn test_wrapped_function_keeps_result() {
    assert_eq!(parse_port("5000"), Ok(5000));
    assert_eq!(parse_port(""), Err(ParseFailure::Empty));
    assert_eq!(parse_port("port"), Err(ParseFailure::NotANumber));
}

#[test]
fn test_wrapped_unit_function() {
    no_arguments();
}

#[test]
fn test_wrapped_method_mutates_self() {
    let mut counter = Counter { value: 1 };
    assert_eq!(counter.bump(2), 3);
    assert_eq!(counter.value, 3);
}

#[test]
fn test_wrapped_async_method() {
    let mut counter = Counter { value: 1 };
    let result = futures::executor::block_on(counter.bump_async(4));
    assert_eq!(result, Ok(5));
}
