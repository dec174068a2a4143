//! Tests for formula evaluation through the public API

use ppformula::{
    builtin_registry, compile, evaluate, parse_formula, EvaluationContext, Formula, FormulaValue,
};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use std::collections::HashMap;

fn fields(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn run(source: &str) -> String {
    compile(source, &HashMap::new()).unwrap()
}

/// Test field references and implicit concatenation
#[test]
fn test_fields_and_concatenation() {
    let values = fields(&[("First", "Ada"), ("Last", "Lovelace")]);
    assert_eq!(compile("[[First]]", &values).unwrap(), "Ada");
    assert_eq!(compile("[[ First ]]", &values).unwrap(), "Ada");
    assert_eq!(compile("[[First]] [[Last]]", &values).unwrap(), "AdaLovelace");
    assert_eq!(compile("Dear [[Title]]", &values).unwrap(), "Dear[[Title]]");
    assert_eq!(compile("", &values).unwrap(), "");
    assert_eq!(compile("Hi // not part of the output", &values).unwrap(), "Hi");
}

/// Test the documented examples for equality, sums and conditionals
#[test]
fn test_core_examples() {
    assert_eq!(run("=EQUALS(a; a)"), "1");
    assert_eq!(run("=EQUALS(a; b)"), "0");
    assert_eq!(run("=!EQUALS(a; b)"), "1");

    let values = fields(&[("A", "2"), ("B", "3")]);
    assert_eq!(compile("=SUM([[A]];[[B]])", &values).unwrap(), "5");

    assert_eq!(run("=IF(=GTNUM(5;3); Pass; Fail)"), "Pass");
    assert_eq!(run("=IF(=GTNUM(2;3); Pass; Fail)"), "Fail");
}

/// Test diagnostics that are rendered inline instead of failing
#[test]
fn test_inline_diagnostics() {
    assert_eq!(run("=CALC(1/0)"), "Infinity");
    assert!(run("=REGEXFIND([; text)").starts_with("[Regex error: "));
    assert!(run("=JSONQUERY(a; '{bad')").starts_with("[JSON error: "));
    assert!(run("=CALC(\"5--3\")").starts_with("[Calc error: "));
    assert_eq!(
        run("=NOTAREALFUNCTION(x)"),
        "[Unknown function: NOTAREALFUNCTION]"
    );
    assert_eq!(
        run("=TABLELOOKUP(Orders; Id; 4; Total)"),
        "[TABLELOOKUP: Not available - requires ProcessPlan backend]"
    );
}

/// Test that only malformed calls are parse errors
#[test]
fn test_parse_errors() {
    let err = compile("=UPPERCASE(abc", &HashMap::new()).unwrap_err();
    assert_eq!(err.to_string(), "Expected RPAREN but got EOF");

    let err = compile("=UPPERCASE abc", &HashMap::new()).unwrap_err();
    assert_eq!(err.to_string(), "Expected LPAREN but got TEXT");

    assert!(parse_formula(") ; stray", builtin_registry()).is_ok());
}

#[test]
fn test_text_functions() {
    assert_eq!(run("=LEFT(3; Hello)"), "Hel");
    assert_eq!(run("=RIGHT(2; Hello)"), "lo");
    assert_eq!(run("=RIGHTOF(@; ada@example.com)"), "example.com");
    assert_eq!(run("=LEFTOFLAST(.; report.final.pdf)"), "report.final");
    assert_eq!(run("=TITLECASE(\"hello wORLD\")"), "Hello World");
    assert_eq!(run("=TRIM(\"  a   b \")"), "a b");
    assert_eq!(run("=REPLACE(a; o; banana)"), "bonono");
    assert_eq!(run("=LENGTH(\"héllo\")"), "5");
    assert_eq!(run("=URLENCODE(\"a b&c\")"), "a%20b%26c");
    assert_eq!(run("=REMOVEDIACRITICS(\"Crème brûlée\")"), "Creme brulee");
    assert_eq!(run("=CONTAINS(ADA; \"Ada Lovelace\")"), "1");
    assert_eq!(run("=!CONTAINS(ADA; \"Ada Lovelace\")"), "0");
    assert_eq!(run("=PARSE(\"<\"; \">\"; \"a <b> c\")"), "b");
    assert_eq!(run("=APPEND(\", \"; a; ; b)"), "a, b");
    assert_eq!(run("=REGEXFIND(\"[0-9]+\"; \"order 1234 shipped\")"), "1234");
    assert_eq!(run("=LEFTOF(@; ada@example.com)"), "ada");
    assert_eq!(run("=REMOVECHARS(\"a-b-c\"; \"-\")"), "abc");
    assert_eq!(run("=REMOVESPACES(\" a b  c \")"), "abc");
    assert_eq!(run("=REMOVESYMBOLS(\"Hi, there! #1\")"), "Hi there 1");
    assert_eq!(run("=NORMALIZETEXT(\"<b>Hello</b> World\")"), "HelloWorld");
    assert_eq!(run("=REGEXWORDSONLY(\"Hello, big world!\")"), "Hello|big|world");
    assert_eq!(run("=ENCLOSE(\"x; y\")"), "x; y");
}

/// Test that user patterns use the `regex` crate syntax
#[test]
fn test_regex_syntax_errors() {
    assert_eq!(
        run("=LISTITEMREGEX(\"[\"; \"a;b\")"),
        "[Regex error: unclosed character class]"
    );
    // Look-around and backreferences are not supported
    assert!(run("=REGEXFIND(\"a(?=b)\"; ab)").starts_with("[Regex error: look-around"));
    assert!(run("=LISTITEMREGEX(\"(a)\\\\1\"; aa)").starts_with("[Regex error: "));
}

/// Test that PARTITION gives up on splits with too many parts
#[test]
fn test_partition_limit() {
    let values = fields(&[("N", "100000000000000000000")]);
    assert_eq!(compile("=PARTITION([[N]]; 1)", &values).unwrap(), "");
    assert_eq!(run("=PARTITION(1000000000000; 1)"), "");
    assert_eq!(run("=PARTITION(10001; 1)"), "");
    assert_eq!(run("=PARTITION(10000; 1)").split(';').count(), 10_000);
}

#[test]
fn test_list_functions() {
    assert_eq!(run("=LISTUNIQUE(a;b;a;c)"), "a;b;c");
    let values = fields(&[("L", "a;b;a;c")]);
    assert_eq!(compile("=LISTUNIQUE([[L]])", &values).unwrap(), "a;b;c");

    assert_eq!(run("=LISTCOUNT(\"a;b;;c\")"), "3");
    assert_eq!(run("=LISTINDEX(2; \"x;y;z\")"), "y");
    assert_eq!(run("=LISTINDEX(0; \"x;y;z\")"), "x;y;z");
    assert_eq!(run("=LISTINDEX(9; \"x;y;z\")"), "");
    assert_eq!(run("=LISTJOIN(\" | \"; \"a;b\")"), "a | b");
    assert_eq!(run("=LISTJOIN(ppsp; \"a;b\")"), "a b");
    assert_eq!(run("=LISTMERGE(\"a;b\"; \"b;c\")"), "a;b;c");
    assert_eq!(run("=LISTDIFF(\"a;b;c\"; b)"), "a;c");
    assert_eq!(run("=LISTINTERSECT(\"a;b;c\"; \"c;a\")"), "a;c");
    assert_eq!(run("=LISTITEMAPPEND(\"@x.com\"; \"a;b\")"), "a@x.com;b@x.com");
    assert_eq!(
        run("=LISTITEMSTARTSWITH(a; \"Apple;banana;avocado\")"),
        "Apple;avocado"
    );
    assert_eq!(run("=SPLIT(\",\"; 2; \"x,y,z\")"), "y");
    assert_eq!(run("=WORDSPLIT(2; \"one two three\")"), "two");
    assert_eq!(
        run("=EMAILSPLIT(0; \"a@x.com, b@y.org\")"),
        "a@x.com;b@y.org"
    );

    assert_eq!(
        run("=LISTITEMCONTAINS(an; \"Banana;apple;mango\")"),
        "Banana;mango"
    );
    assert_eq!(run("=LISTITEMENDSWITH(a; \"Banana;apple;pizza\")"), "Banana;pizza");
    assert_eq!(run("=LISTITEMLEFT(2; \"abc;de;f\")"), "ab;de;f");
    assert_eq!(run("=LISTITEMRIGHT(2; \"abc;de;f\")"), "bc;de;f");
    assert_eq!(run("=LISTITEMLEFTOF(@; \"a@x.com;b@y.org\")"), "a;b");
    assert_eq!(run("=LISTITEMRIGHTOF(@; \"a@x.com;b@y.org\")"), "x.com;y.org");
    assert_eq!(run("=LISTITEMPREPEND(\"#\"; \"1;2\")"), "#1;#2");
    assert_eq!(run("=LISTITEMREGEX(\"^[0-9]+$\"; \"12;ab;7\")"), "12;7");
    assert_eq!(run("=LISTASLINES(\"a;b\")"), "a\nb");

    let text = fields(&[("T", "one\r\ntwo\nthree")]);
    assert_eq!(compile("=LINESPLIT(2; [[T]])", &text).unwrap(), "two");
    assert_eq!(compile("=LINESPLIT(0; [[T]])", &text).unwrap(), "one;two;three");
}

#[test]
fn test_math_functions() {
    assert_eq!(run("=ROUND(2; 3.14159)"), "3.14");
    assert_eq!(run("=MAX(3; 9; 2)"), "9");
    assert_eq!(run("=MIN(3; 9; 2)"), "2");
    assert_eq!(run("=NUM(\"Total: $42.50\")"), "42.5");
    assert_eq!(run("=PARTITION(10; 4)"), "4;4;2");
    assert_eq!(run("=PARTITION(10; 0)"), "");
    assert_eq!(run("=FLOOR(3.7)"), "3");
    assert_eq!(run("=FLOOR(\"-2.5\")"), "-3");
    assert_eq!(run("=CEILING(3.2)"), "4");
    assert_eq!(run("=NUMSPLIT(\"a1 b-2.5 c30\")"), "1;-2.5;30");
    assert_eq!(run("=GTENUM(3; 3)"), "1");
    assert_eq!(run("=LTNUM(2; 3)"), "1");
    assert_eq!(run("=LTENUM(4; 3)"), "0");
    assert_eq!(run("=BENUM(5; 5; 10)"), "1");
    assert_eq!(run("=BNUM(5; 5; 10)"), "0");
    assert_eq!(run("=CALC(\"2 * (3 + 4)\")"), "14");

    let n: f64 = run("=RANDOMNUM(1; 6)").parse().unwrap();
    assert!((1.0..=6.0).contains(&n) && n.fract() == 0.0);
}

#[test]
fn test_logical_functions() {
    assert_eq!(run("=IF(0; a; 0; b; c)"), "c");
    assert_eq!(run("=IF(0; a; 1; b; c)"), "b");
    assert_eq!(run("=IF(0; a)"), "");

    let values = fields(&[("Blank", "  ")]);
    assert_eq!(compile("=FIRSTVALUE([[Blank]]; x)", &values).unwrap(), "x");
    assert_eq!(compile("=ISEMPTY([[Blank]])", &values).unwrap(), "1");
    assert_eq!(compile("=HASVALUE([[Blank]])", &values).unwrap(), "0");
    assert_eq!(run("=NOT(0)"), "1");
    assert_eq!(run("=ANYTRUE(0; true)"), "1");
    assert_eq!(run("=ISTRUE(1; yes)"), "0");
}

#[test]
fn test_date_functions() {
    assert_eq!(run("=DATEDIFF(day; 2024-01-01; 2024-01-31)"), "30");
    assert_eq!(run("=DATEDIFF(month; 2024-01-31; 2024-03-01)"), "2");
    assert_eq!(run("=DATEADD(weekday; 1; 2024-01-05)"), "2024-01-08");
    assert_eq!(run("=DATEADD(month; 1; 2024-01-31)"), "2024-03-02");
    assert_eq!(run("=DATEADD(year; -1; 2024-02-29)"), "2023-03-01");
    assert_eq!(run("=DATEPART(weekday; 2024-01-07)"), "0");
    assert_eq!(run("=DATEPART(yearday; 2024-02-01)"), "32");
    assert_eq!(run("=MONTHLASTDAY(2024-02-10)"), "2024-02-29");
    assert_eq!(run("=MONTHLASTDAY(2024-02-10; 1)"), "2024-03-01");
    assert_eq!(run("=FISCALYEAR(7; 2024-03-01)"), "2023");
    assert_eq!(run("=FISCALMONTH(7; 2024-03-01)"), "9");
    assert_eq!(
        run("=DATELIST(2024-01-30; 2024-02-02)"),
        "2024-01-30;2024-01-31;2024-02-01;2024-02-02"
    );
    assert_eq!(run("=DATESERIAL(2024; 14; 1)"), "2025-02-01");
    assert_eq!(run("=BEDATE(2024-01-01; 2024-01-01; 2024-12-31)"), "1");
    assert_eq!(run("=BDATE(2024-01-01; 2024-01-01; 2024-12-31)"), "0");
    assert_eq!(run("=YEAR(nonsense)"), "0");
    assert_eq!(run("=DATEADD(day; 1; nonsense)"), "");

    assert_eq!(run("=DATEDIFF(year; 2023-12-31; 2024-01-01)"), "1");
    assert_eq!(run("=DATEDIFF(week; 2024-01-01; 2024-01-15)"), "2");
    assert_eq!(run("=DATEDIFF(week; 2024-01-01; 2024-01-14)"), "1");
    assert_eq!(run("=DATEPART(yearweek; 2024-01-01)"), "1");
    assert_eq!(run("=DATEPART(yearweek; 2023-01-01)"), "52");
    assert_eq!(
        run("=DATETIMEMERGE(\"2024-01-05\"; \"09:30\")"),
        "2024-01-05 09:30"
    );

    // Rounding only truncates to the day
    assert_eq!(run("=DATEROUND(hour; 2; \"2024-01-05 14:30\")"), "2024-01-05");
    assert_eq!(run("=DATEROUND(day; 1; nonsense)"), "");
}

#[test]
fn test_date_comparisons() {
    assert_eq!(run("=GTDATE(2024-02-01; 2024-01-01)"), "1");
    assert_eq!(run("=GTDATE(2024-01-01; 2024-01-01)"), "0");
    assert_eq!(run("=GTEDATE(2024-01-01; 2024-01-01)"), "1");
    assert_eq!(run("=LTDATE(2023-12-31; 2024-01-01)"), "1");
    assert_eq!(run("=LTDATE(2024-01-01; 2024-01-01)"), "0");
    assert_eq!(run("=LTEDATE(2024-01-01; 2024-01-01)"), "1");

    // A missing date compares false either way round
    assert_eq!(run("=GTDATE(nonsense; 2024-01-01)"), "0");
    assert_eq!(run("=LTDATE(nonsense; 2024-01-01)"), "0");
    assert_eq!(run("=GTEDATE(2024-01-01; nonsense)"), "0");
    assert_eq!(run("=LTEDATE(2024-01-01; nonsense)"), "0");
}

#[test]
fn test_json_functions() {
    assert_eq!(run("=JSONQUERY(user.name; '{\"user\":{\"name\":\"Ada\"}}')"), "Ada");
    assert_eq!(run("=JSONQUERY(user.age; '{\"user\":{\"name\":\"Ada\"}}')"), "");
    assert_eq!(run("=JSONQUERY(tags; '{\"tags\":[\"a\",\"b\"]}')"), "[\"a\",\"b\"]");
    assert_eq!(run("=JSONUPDATE('{\"a\":1}'; b; 2)"), "{\"a\":1,\"b\":2}");
    assert_eq!(run("=JSONUPDATE(\"\"; name; Ada)"), "{\"name\":\"Ada\"}");
    assert_eq!(run("=JSONFIFO('[1,2]'; 3; 2)"), "[3,1]");
    assert_eq!(run("=JSONINDEX(-1; '[\"x\",\"y\"]')"), "y");
    assert_eq!(run("=JSONREMOVE(0; '[1,2,3]')"), "[2,3]");
    assert_eq!(run("=JSONREMOVE(0; '{\"a\":1}')"), "{\"a\":1}");
    assert_eq!(run("=JSONENCODE('say \"hi\"')"), "\"say \\\"hi\\\"\"");
    assert_eq!(run("=JSONEXTRACT('result: {\"ok\":true} done')"), "{\"ok\":true}");
}

#[test]
fn test_format() {
    assert_eq!(run("=FORMAT(\"#,##0.00\"; 1234.5)"), "1,234.50");
    assert_eq!(run("=FORMAT(\"000\"; 7)"), "007");
    assert_eq!(run("=FORMAT(\"dddd, MMMM d\"; 2024-03-05)"), "Tuesday, March 5");
    assert_eq!(run("=FORMAT(\"yyyy/MM/dd\"; 2024-03-05)"), "2024/03/05");
}

/// Test that a parsed formula can be evaluated against many field maps
#[test]
fn test_formula_reuse() {
    let formula = Formula::parse("=UPPERCASE([[Name]])").unwrap();
    assert_eq!(formula.fields(), vec!["Name"]);

    let names = ["ada", "grace", "edsger"];
    let results: Vec<String> = names
        .iter()
        .map(|name| formula.evaluate(&fields(&[("Name", name)])).as_string())
        .collect();
    assert_eq!(results, vec!["ADA", "GRACE", "EDSGER"]);
}

/// Test evaluation through an explicit context
#[test]
fn test_explicit_context() {
    let values = fields(&[("Qty", "3")]);
    let ctx = EvaluationContext::new(builtin_registry(), Some(&values));
    let ast = parse_formula("=SUM([[Qty]]; 4)", builtin_registry()).unwrap();
    assert_eq!(evaluate(&ast, &ctx), FormulaValue::Number(7.0));
}

proptest! {
    #[test]
    fn prop_field_echo(name in "[A-Za-z][A-Za-z0-9_]{0,15}", value in "\\PC*") {
        let source = format!("[[{}]]", name);
        let values = fields(&[(name.as_str(), value.as_str())]);
        prop_assert_eq!(compile(&source, &values).unwrap(), value);
        prop_assert_eq!(compile(&source, &HashMap::new()).unwrap(), source.clone());
    }

    #[test]
    fn prop_dateserial_round_trip(y in 1000i32..3000, m in 1u32..=12, d in 1u32..=28) {
        let serial = format!("=DATESERIAL({}; {}; {})", y, m, d);
        prop_assert_eq!(run(&format!("=YEAR({})", serial)), y.to_string());
        prop_assert_eq!(run(&format!("=MONTH({})", serial)), m.to_string());
        prop_assert_eq!(run(&format!("=MONTHDAY({})", serial)), d.to_string());
    }

    #[test]
    fn prop_reevaluation_is_stable(a in "[a-z;]{0,12}", b in -1000i32..1000) {
        let formula = Formula::parse(
            "=LISTUNIQUE([[A]]) =CALC([[B]] * 2) =UPPERCASE([[A]]) =DATEADD(day; [[B]]; 2024-01-01)",
        )
        .unwrap();
        let values = fields(&[("A", a.as_str()), ("B", &b.to_string())]);
        prop_assert_eq!(formula.evaluate(&values), formula.evaluate(&values));
    }
}
