//! Built-in formula functions

pub mod calc;
pub mod date;
pub mod format;
pub mod json;
pub mod list;
pub mod logical;
pub mod math;
pub mod text;

use crate::evaluator::Args;
use crate::value::FormulaValue;
use ahash::AHashMap;
use once_cell::sync::Lazy;
use std::fmt;

/// Function implementation signature
///
/// Functions receive their arguments unevaluated and pull values out on demand, so `IF`
/// and `FIRSTVALUE` only evaluate the branches they need.
pub type FunctionImpl = fn(&Args<'_, '_>) -> FormulaValue;

/// How much of a function is available without the ProcessPlan backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum ImplementationStatus {
    Implemented,
    Partial,
    NotImplemented,
}

impl ImplementationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImplementationStatus::Implemented => "implemented",
            ImplementationStatus::Partial => "partial",
            ImplementationStatus::NotImplemented => "not-implemented",
        }
    }
}

impl fmt::Display for ImplementationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ImplementationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "implemented" => Ok(ImplementationStatus::Implemented),
            "partial" => Ok(ImplementationStatus::Partial),
            "not-implemented" | "not_implemented" | "notimplemented" => {
                Ok(ImplementationStatus::NotImplemented)
            }
            other => Err(format!("unknown implementation status: {}", other)),
        }
    }
}

/// Function definition
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct FunctionDef {
    /// Function name (uppercase, `!` prefix for negated variants)
    pub name: &'static str,
    /// Parameter names, `...` marks a repeating tail
    pub params: &'static [&'static str],
    pub description: &'static str,
    pub example: &'static str,
    pub status: ImplementationStatus,
    /// Implementation (None for backend-only functions)
    #[cfg_attr(feature = "serde", serde(skip))]
    pub implementation: Option<FunctionImpl>,
}

impl FunctionDef {
    /// Call template shown to users, e.g. `=LEFT(Count; Value)`
    pub fn syntax(&self) -> String {
        format!("={}({})", self.name, self.params.join("; "))
    }
}

/// Count of functions per implementation status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct StatusSummary {
    pub implemented: usize,
    pub partial: usize,
    pub not_implemented: usize,
}

impl StatusSummary {
    pub fn total(&self) -> usize {
        self.implemented + self.partial + self.not_implemented
    }
}

static BUILTIN_REGISTRY: Lazy<FunctionRegistry> = Lazy::new(FunctionRegistry::new);

/// The process-wide registry of built-in functions
pub fn builtin_registry() -> &'static FunctionRegistry {
    &BUILTIN_REGISTRY
}

/// Function registry
pub struct FunctionRegistry {
    functions: AHashMap<&'static str, FunctionDef>,
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl FunctionRegistry {
    /// Create a new registry with all built-in functions
    pub fn new() -> Self {
        let mut registry = Self {
            functions: AHashMap::new(),
        };

        registry.register_text_functions();
        registry.register_math_functions();
        registry.register_logical_functions();
        registry.register_list_functions();
        registry.register_date_functions();
        registry.register_json_functions();
        registry.register_format_functions();
        registry.register_backend_functions();

        tracing::trace!(count = registry.functions.len(), "function registry built");
        registry
    }

    /// Look up a function by name
    pub fn get(&self, name: &str) -> Option<&FunctionDef> {
        self.functions.get(name.to_uppercase().as_str())
    }

    /// Check whether a function is registered
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Register a function, replacing any previous definition with the same name
    pub fn register(&mut self, def: FunctionDef) {
        self.functions.insert(def.name, def);
    }

    /// All registered names, sorted
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self.functions.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// All definitions, sorted by name
    pub fn iter(&self) -> impl Iterator<Item = &FunctionDef> + '_ {
        self.names()
            .into_iter()
            .filter_map(move |name| self.functions.get(name))
    }

    /// Call template for `name`, if registered
    pub fn syntax(&self, name: &str) -> Option<String> {
        self.get(name).map(FunctionDef::syntax)
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    pub fn status_summary(&self) -> StatusSummary {
        let mut summary = StatusSummary::default();
        for def in self.functions.values() {
            match def.status {
                ImplementationStatus::Implemented => summary.implemented += 1,
                ImplementationStatus::Partial => summary.partial += 1,
                ImplementationStatus::NotImplemented => summary.not_implemented += 1,
            }
        }
        summary
    }

    fn register_text_functions(&mut self) {
        self.register(FunctionDef {
            name: "CONTAINS",
            params: &["DoesThisValueExist", "AnywhereInsideThisValue"],
            description: "Returns true if search text is found within other text.",
            example: "=CONTAINS(urgent; [[Description]])",
            status: ImplementationStatus::Implemented,
            implementation: Some(text::fn_contains),
        });

        self.register(FunctionDef {
            name: "!CONTAINS",
            params: &["DoesThisValueNotExist", "AnywhereInsideThisValue"],
            description: "Returns true if a search text is NOT found within some other text.",
            example: "=!CONTAINS(SearchText; [[Field]])",
            status: ImplementationStatus::Implemented,
            implementation: Some(text::fn_not_contains),
        });

        self.register(FunctionDef {
            name: "EQUALS",
            params: &["DoesThisValue", "EqualThisValue", "AndThisValue", "..."],
            description: "Returns true if first value equals ALL other values.",
            example: "=EQUALS([[Status]]; Approved)",
            status: ImplementationStatus::Implemented,
            implementation: Some(text::fn_equals),
        });

        self.register(FunctionDef {
            name: "!EQUALS",
            params: &["DoesThisValue", "NotEqualThisValue", "OrThisValue", "..."],
            description: "Returns true if the first value does NOT equal any of the other values.",
            example: "=!EQUALS([[Status]]; Approved; Complete)",
            status: ImplementationStatus::Implemented,
            implementation: Some(text::fn_not_equals),
        });

        self.register(FunctionDef {
            name: "APPEND",
            params: &["Separator", "Item1", "Item2", "..."],
            description: "Combines values together with a specified separator character.",
            example: "[[FirstName]]=APPEND( ; [[LastName]])",
            status: ImplementationStatus::Implemented,
            implementation: Some(text::fn_append),
        });

        self.register(FunctionDef {
            name: "LEFT",
            params: &["Count", "Value"],
            description: "Returns specified characters from start of string.",
            example: "=LEFT(3; [[Code]])",
            status: ImplementationStatus::Implemented,
            implementation: Some(text::fn_left),
        });

        self.register(FunctionDef {
            name: "RIGHT",
            params: &["Count", "Value"],
            description: "Returns specified chars from end of string.",
            example: "=RIGHT(4; [[Filename]])",
            status: ImplementationStatus::Implemented,
            implementation: Some(text::fn_right),
        });

        self.register(FunctionDef {
            name: "LEFTOF",
            params: &["ReturnLeftOf", "SearchInString"],
            description: "Returns text left of first occurrence of characters.",
            example: "=LEFTOF(@; [[Email]])",
            status: ImplementationStatus::Implemented,
            implementation: Some(text::fn_leftof),
        });

        self.register(FunctionDef {
            name: "RIGHTOF",
            params: &["ReturnRightOf", "SearchInString"],
            description: "Returns text right of first occurrence.",
            example: "=RIGHTOF(@; [[Email]])",
            status: ImplementationStatus::Implemented,
            implementation: Some(text::fn_rightof),
        });

        self.register(FunctionDef {
            name: "LEFTOFLAST",
            params: &["ReturnLeftOf", "SearchInString"],
            description: "Returns text left of LAST occurrence.",
            example: "=LEFTOFLAST(/; [[FilePath]])",
            status: ImplementationStatus::Implemented,
            implementation: Some(text::fn_leftoflast),
        });

        self.register(FunctionDef {
            name: "RIGHTOFLAST",
            params: &["ReturnRightOf", "SearchInString"],
            description: "Returns text right of LAST occurrence.",
            example: "=RIGHTOFLAST(/; [[FilePath]])",
            status: ImplementationStatus::Implemented,
            implementation: Some(text::fn_rightoflast),
        });

        self.register(FunctionDef {
            name: "LENGTH",
            params: &["CharacterString"],
            description: "Returns character count in string.",
            example: "=LENGTH([[Description]])",
            status: ImplementationStatus::Implemented,
            implementation: Some(text::fn_length),
        });

        self.register(FunctionDef {
            name: "LOWERCASE",
            params: &["String"],
            description: "Converts string to lowercase.",
            example: "=LOWERCASE([[Name]])",
            status: ImplementationStatus::Implemented,
            implementation: Some(text::fn_lowercase),
        });

        self.register(FunctionDef {
            name: "UPPERCASE",
            params: &["String"],
            description: "Capitalizes each letter.",
            example: "=UPPERCASE([[Code]])",
            status: ImplementationStatus::Implemented,
            implementation: Some(text::fn_uppercase),
        });

        self.register(FunctionDef {
            name: "TITLECASE",
            params: &["TextParameter"],
            description: "Capitalizes first letter of each word.",
            example: "=TITLECASE([[name]])",
            status: ImplementationStatus::Implemented,
            implementation: Some(text::fn_titlecase),
        });

        self.register(FunctionDef {
            name: "TRIM",
            params: &["TextToTrim"],
            description: "Removes leading/trailing spaces and double spaces.",
            example: "=TRIM([[Input]])",
            status: ImplementationStatus::Implemented,
            implementation: Some(text::fn_trim),
        });

        self.register(FunctionDef {
            name: "REPLACE",
            params: &["SearchForText", "NewText", "SearchWithinText"],
            description: "Finds and replaces text.",
            example: "=REPLACE(old; new; [[Text]])",
            status: ImplementationStatus::Implemented,
            implementation: Some(text::fn_replace),
        });

        self.register(FunctionDef {
            name: "REMOVECHARS",
            params: &["Value", "CharsToRemove"],
            description: "Removes specified characters from text.",
            example: "=REMOVECHARS([[Phone]]; -() )",
            status: ImplementationStatus::Implemented,
            implementation: Some(text::fn_removechars),
        });

        self.register(FunctionDef {
            name: "REMOVESPACES",
            params: &["Value"],
            description: "Removes all spaces from text.",
            example: "=REMOVESPACES([[Code]])",
            status: ImplementationStatus::Implemented,
            implementation: Some(text::fn_removespaces),
        });

        self.register(FunctionDef {
            name: "REMOVEDIACRITICS",
            params: &["Value"],
            description: "Removes accents, replacing with equivalent chars.",
            example: "=REMOVEDIACRITICS(cafe)",
            status: ImplementationStatus::Partial,
            implementation: Some(text::fn_removediacritics),
        });

        self.register(FunctionDef {
            name: "REMOVESYMBOLS",
            params: &["Value"],
            description: "Removes symbols, keeping alphanumeric and spaces.",
            example: "=REMOVESYMBOLS([[Input]])",
            status: ImplementationStatus::Partial,
            implementation: Some(text::fn_removesymbols),
        });

        self.register(FunctionDef {
            name: "NORMALIZETEXT",
            params: &["TextValue"],
            description: "Removes spaces, formatting, HTML, carriage returns, line feeds.",
            example: "=NORMALIZETEXT([[Input]])",
            status: ImplementationStatus::Partial,
            implementation: Some(text::fn_normalizetext),
        });

        self.register(FunctionDef {
            name: "PARSE",
            params: &["GetRightOfThisText", "GetLeftOfThisText", "SearchWithinThisText"],
            description: "Returns text between two markers. Special: crlf, tab.",
            example: "=PARSE(Name:; Age:; [[Data]])",
            status: ImplementationStatus::Implemented,
            implementation: Some(text::fn_parse),
        });

        self.register(FunctionDef {
            name: "REGEXFIND",
            params: &["RegEx", "StringToSearch"],
            description: "Returns text matching regex pattern.",
            example: "=REGEXFIND(\\\\d+; This has number: 263)",
            status: ImplementationStatus::Implemented,
            implementation: Some(text::fn_regexfind),
        });

        self.register(FunctionDef {
            name: "REGEXWORDSONLY",
            params: &["TextToConvertToRegex"],
            description: "Converts text to regex matching words only, ignoring punctuation.",
            example: "=REGEXWORDSONLY([[SearchText]])",
            status: ImplementationStatus::Partial,
            implementation: Some(text::fn_regexwordsonly),
        });

        self.register(FunctionDef {
            name: "URLENCODE",
            params: &["CharacterToEncode"],
            description: "Encodes characters for URL use.",
            example: "=URLENCODE([[SearchTerm]])",
            status: ImplementationStatus::Partial,
            implementation: Some(text::fn_urlencode),
        });

        self.register(FunctionDef {
            name: "ENCLOSE",
            params: &["ValueYouWantToHide"],
            description: "Hides text from rest of function. Useful for tokens with semicolons/HTML.",
            example: "=ENCLOSE([[FieldWithSemicolons]])",
            status: ImplementationStatus::Implemented,
            implementation: Some(text::fn_enclose),
        });
    }

    fn register_math_functions(&mut self) {
        self.register(FunctionDef {
            name: "CALC",
            params: &["MathematicalExpression"],
            description: "Performs mathematical operations on numbers or numeric fields.",
            example: "=CALC([[Price]] * [[Quantity]])",
            status: ImplementationStatus::Implemented,
            implementation: Some(calc::fn_calc),
        });

        self.register(FunctionDef {
            name: "NUM",
            params: &["Parameter"],
            description: "Extracts number by stripping non-numeric chars.",
            example: "=NUM([[PriceText]])",
            status: ImplementationStatus::Implemented,
            implementation: Some(math::fn_num),
        });

        self.register(FunctionDef {
            name: "NUMSPLIT",
            params: &["Parameter"],
            description: "Extracts all numbers as semicolon list.",
            example: "=NUMSPLIT(123 Sample St, NY 10016)",
            status: ImplementationStatus::Partial,
            implementation: Some(math::fn_numsplit),
        });

        self.register(FunctionDef {
            name: "ROUND",
            params: &["NumOfDecimals", "AnyNumber"],
            description: "Rounds to specified decimal places.",
            example: "=ROUND(2; [[Total]])",
            status: ImplementationStatus::Implemented,
            implementation: Some(math::fn_round),
        });

        self.register(FunctionDef {
            name: "FLOOR",
            params: &["AnyNumber"],
            description: "Returns largest integer <= the specified number.",
            example: "=FLOOR(4.8)",
            status: ImplementationStatus::Implemented,
            implementation: Some(math::fn_floor),
        });

        self.register(FunctionDef {
            name: "CEILING",
            params: &["AnyNumber"],
            description: "Returns the smallest integer >= the specified number.",
            example: "=CEILING(4.2)",
            status: ImplementationStatus::Implemented,
            implementation: Some(math::fn_ceiling),
        });

        self.register(FunctionDef {
            name: "MAX",
            params: &["Parameter1", "Parameter2", "..."],
            description: "Returns maximum number from list.",
            example: "=MAX([[Score1]]; [[Score2]]; [[Score3]])",
            status: ImplementationStatus::Implemented,
            implementation: Some(math::fn_max),
        });

        self.register(FunctionDef {
            name: "MIN",
            params: &["Parameter1", "Parameter2", "..."],
            description: "Returns minimum number from list.",
            example: "=MIN([[Price1]]; [[Price2]])",
            status: ImplementationStatus::Implemented,
            implementation: Some(math::fn_min),
        });

        self.register(FunctionDef {
            name: "SUM",
            params: &["Parameter1", "Parameter2", "..."],
            description: "Sums list of numbers.",
            example: "=SUM([[Item1]]; [[Item2]]; [[Item3]])",
            status: ImplementationStatus::Implemented,
            implementation: Some(math::fn_sum),
        });

        self.register(FunctionDef {
            name: "RANDOMNUM",
            params: &["MinimumNumber", "MaximumNumber"],
            description: "Returns random number between bounds.",
            example: "=RANDOMNUM(1; 100)",
            status: ImplementationStatus::Implemented,
            implementation: Some(math::fn_randomnum),
        });

        self.register(FunctionDef {
            name: "PARTITION",
            params: &["NumberToBePartitioned", "Divisor"],
            description: "Returns list of integers summing to original number.",
            example: "=PARTITION(100; 31)",
            status: ImplementationStatus::Implemented,
            implementation: Some(math::fn_partition),
        });

        self.register(FunctionDef {
            name: "GTNUM",
            params: &["IsThisNumber", "GreaterThanThisNumber"],
            description: "Returns 1 if first number > second, 0 if false.",
            example: "=GTNUM([[Total]]; 1000)",
            status: ImplementationStatus::Implemented,
            implementation: Some(math::fn_gtnum),
        });

        self.register(FunctionDef {
            name: "GTENUM",
            params: &["IsThisNumber", "GreaterOrEqualToThisNumber"],
            description: "Returns 1 if first number >= second, 0 if false.",
            example: "=GTENUM([[Score]]; 70)",
            status: ImplementationStatus::Implemented,
            implementation: Some(math::fn_gtenum),
        });

        self.register(FunctionDef {
            name: "LTNUM",
            params: &["IsThisValue", "LessThanThisValue"],
            description: "Returns 1 if first value < second, 0 if false.",
            example: "=LTNUM([[Age]]; 18)",
            status: ImplementationStatus::Implemented,
            implementation: Some(math::fn_ltnum),
        });

        self.register(FunctionDef {
            name: "LTENUM",
            params: &["Value1", "Value2"],
            description: "Returns 1 if first value <= second, 0 if false.",
            example: "=LTENUM([[Count]]; 10)",
            status: ImplementationStatus::Implemented,
            implementation: Some(math::fn_ltenum),
        });

        self.register(FunctionDef {
            name: "BENUM",
            params: &["IsThisNum", "GreaterThanOrEqualToThisNum", "AndLessThanOrEqualToThisNum"],
            description: "Returns 1 if number is between or equal to two numbers (inclusive).",
            example: "=BENUM([[Score]]; 0; 100)",
            status: ImplementationStatus::Implemented,
            implementation: Some(math::fn_benum),
        });

        self.register(FunctionDef {
            name: "BNUM",
            params: &["IsThisNum", "GreaterThanThisNum", "AndLessThanThisNum"],
            description: "Returns 1 if number is between two numbers (exclusive).",
            example: "=BNUM([[Score]]; 0; 100)",
            status: ImplementationStatus::Implemented,
            implementation: Some(math::fn_bnum),
        });
    }

    fn register_logical_functions(&mut self) {
        self.register(FunctionDef {
            name: "IF",
            params: &[
                "ConditionCheck",
                "IfTrueReturnThis",
                "AnotherCondition OR IfFalseReturnThis",
                "IfTrueReturnThis",
                "OptionalIfFalse",
            ],
            description: "Checks conditions, returns corresponding values. First true wins.",
            example: "=IF(=GTNUM([[Score]]; 70); Pass; Fail)",
            status: ImplementationStatus::Implemented,
            implementation: Some(logical::fn_if),
        });

        self.register(FunctionDef {
            name: "HASVALUE",
            params: &["DoesAnyValueExistHere"],
            description: "Returns true if any value exists (not empty).",
            example: "=HASVALUE([[Comments]])",
            status: ImplementationStatus::Implemented,
            implementation: Some(logical::fn_hasvalue),
        });

        self.register(FunctionDef {
            name: "ISEMPTY",
            params: &["IsTheValueEmpty"],
            description: "Returns true if field is empty.",
            example: "=ISEMPTY([[Notes]])",
            status: ImplementationStatus::Implemented,
            implementation: Some(logical::fn_isempty),
        });

        self.register(FunctionDef {
            name: "ISTRUE",
            params: &["IsThisTrue", "OptionalIsThisTrue", "..."],
            description: "Returns true if ALL values are true. Numbers > 0 are true.",
            example: "=ISTRUE([[IsActive]]; [[IsVerified]])",
            status: ImplementationStatus::Implemented,
            implementation: Some(logical::fn_istrue),
        });

        self.register(FunctionDef {
            name: "ANYTRUE",
            params: &["IsThisFunctionTrue", "IsThisFunctionTrue", "..."],
            description: "Returns 1 (true) if ANY parameter returns true. Numbers > 0 are true.",
            example: "=ANYTRUE(=EQUALS([[Status]]; Complete); =GTNUM([[Score]]; 80))",
            status: ImplementationStatus::Implemented,
            implementation: Some(logical::fn_anytrue),
        });

        self.register(FunctionDef {
            name: "NOT",
            params: &["BooleanParameter"],
            description: "Returns opposite of Boolean (True->False). Zero is false.",
            example: "=NOT(=ISEMPTY([[Field]]))",
            status: ImplementationStatus::Implemented,
            implementation: Some(logical::fn_not),
        });

        self.register(FunctionDef {
            name: "FIRSTVALUE",
            params: &["Item1", "Item2", "Item3", "..."],
            description: "Returns first non-empty value from list.",
            example: "=FIRSTVALUE([[PreferredName]]; [[FirstName]]; Unknown)",
            status: ImplementationStatus::Implemented,
            implementation: Some(logical::fn_firstvalue),
        });
    }

    fn register_list_functions(&mut self) {
        self.register(FunctionDef {
            name: "SPLIT",
            params: &["CharacterToSplitOn", "IndexOfSplitToReturn", "TextToSplit"],
            description: "Splits on character, returns section. Index 0 returns all.",
            example: "=SPLIT(-; 2; [[Code]])",
            status: ImplementationStatus::Implemented,
            implementation: Some(list::fn_split),
        });

        self.register(FunctionDef {
            name: "LISTCOUNT",
            params: &["Item1", "Item2", "..."],
            description: "Returns total items in list.",
            example: "=LISTCOUNT([[Tags]])",
            status: ImplementationStatus::Implemented,
            implementation: Some(list::fn_listcount),
        });

        self.register(FunctionDef {
            name: "LISTINDEX",
            params: &["ReturnIndex", "SemicolonSeparatedTextList"],
            description: "Returns entry at specified index.",
            example: "=LISTINDEX(2; [[Options]])",
            status: ImplementationStatus::Implemented,
            implementation: Some(list::fn_listindex),
        });

        self.register(FunctionDef {
            name: "LISTJOIN",
            params: &["NewListItemSeparator", "SemicolonSeparatedList"],
            description: "Joins entries with separator. Keywords: ppnewline, pptab, ppcrlf, ppsp.",
            example: "=LISTJOIN(ppnewline; [[Items]])",
            status: ImplementationStatus::Implemented,
            implementation: Some(list::fn_listjoin),
        });

        self.register(FunctionDef {
            name: "LISTMERGE",
            params: &["SemicolonSeparatedList1", "SemicolonSeparatedList2"],
            description: "Returns all unique entries from both lists.",
            example: "=LISTMERGE([[List1]]; [[List2]])",
            status: ImplementationStatus::Implemented,
            implementation: Some(list::fn_listmerge),
        });

        self.register(FunctionDef {
            name: "LISTDIFF",
            params: &["SemicolonSeparatedList1", "SemicolonSeparatedList2"],
            description: "Returns first list minus second list entries.",
            example: "=LISTDIFF([[AllItems]]; [[CompletedItems]])",
            status: ImplementationStatus::Implemented,
            implementation: Some(list::fn_listdiff),
        });

        self.register(FunctionDef {
            name: "LISTINTERSECT",
            params: &["SemicolonSeparatedList1", "SemicolonSeparatedList2"],
            description: "Returns entries appearing in both lists.",
            example: "=LISTINTERSECT([[Skills]]; [[Required]])",
            status: ImplementationStatus::Implemented,
            implementation: Some(list::fn_listintersect),
        });

        self.register(FunctionDef {
            name: "LISTUNIQUE",
            params: &["SemicolonSeparatedList"],
            description: "Returns unique entries only (removes duplicates).",
            example: "=LISTUNIQUE([[AllTags]])",
            status: ImplementationStatus::Implemented,
            implementation: Some(list::fn_listunique),
        });

        self.register(FunctionDef {
            name: "LISTASLINES",
            params: &["SemicolonSeparatedList"],
            description: "Converts list to text with each entry on separate line.",
            example: "=LISTASLINES([[Items]])",
            status: ImplementationStatus::Implemented,
            implementation: Some(list::fn_listaslines),
        });

        self.register(FunctionDef {
            name: "LINESPLIT",
            params: &["IndexOfSplitListToReturn", "TextToSplit"],
            description: "Splits multiline text into list. Index 0 returns all.",
            example: "=LINESPLIT(1; [[Address]])",
            status: ImplementationStatus::Implemented,
            implementation: Some(list::fn_linesplit),
        });

        self.register(FunctionDef {
            name: "WORDSPLIT",
            params: &["ReturnWordIndex", "PlainText"],
            description: "Splits text into word list. Index 0 returns all.",
            example: "=WORDSPLIT(1; [[FullName]])",
            status: ImplementationStatus::Partial,
            implementation: Some(list::fn_wordsplit),
        });

        self.register(FunctionDef {
            name: "EMAILSPLIT",
            params: &["ReturnIndex", "EmailAddressText"],
            description: "Splits emails into semicolon list. Index 0 returns all.",
            example: "=EMAILSPLIT(0; email1@test.com, email2@test.com)",
            status: ImplementationStatus::Partial,
            implementation: Some(list::fn_emailsplit),
        });

        self.register(FunctionDef {
            name: "LISTITEMAPPEND",
            params: &["AppendText", "SemicolonSeparatedList"],
            description: "Appends text to each list entry.",
            example: "=LISTITEMAPPEND(.pdf; [[Filenames]])",
            status: ImplementationStatus::Partial,
            implementation: Some(list::fn_listitemappend),
        });

        self.register(FunctionDef {
            name: "LISTITEMPREPEND",
            params: &["PrependText", "SemicolonSeparatedList"],
            description: "Prepends text to each list entry.",
            example: "=LISTITEMPREPEND(ID-; [[Numbers]])",
            status: ImplementationStatus::Partial,
            implementation: Some(list::fn_listitemprepend),
        });

        self.register(FunctionDef {
            name: "LISTITEMCONTAINS",
            params: &["SearchForText", "SemicolonSeparatedList"],
            description: "Returns entries containing search text.",
            example: "=LISTITEMCONTAINS(error; [[LogEntries]])",
            status: ImplementationStatus::Partial,
            implementation: Some(list::fn_listitemcontains),
        });

        self.register(FunctionDef {
            name: "LISTITEMSTARTSWITH",
            params: &["SearchForText", "SemicolonSeparatedList"],
            description: "Returns entries starting with text.",
            example: "=LISTITEMSTARTSWITH(A; [[Codes]])",
            status: ImplementationStatus::Partial,
            implementation: Some(list::fn_listitemstartswith),
        });

        self.register(FunctionDef {
            name: "LISTITEMENDSWITH",
            params: &["SearchForText", "SemicolonSeparatedList"],
            description: "Returns entries ending with text.",
            example: "=LISTITEMENDSWITH(.pdf; [[Files]])",
            status: ImplementationStatus::Partial,
            implementation: Some(list::fn_listitemendswith),
        });

        self.register(FunctionDef {
            name: "LISTITEMLEFT",
            params: &["NumberOfCharsToReturn", "SemicolonSeparatedList"],
            description: "Returns leftmost chars from each entry.",
            example: "=LISTITEMLEFT(4; [[Codes]])",
            status: ImplementationStatus::Partial,
            implementation: Some(list::fn_listitemleft),
        });

        self.register(FunctionDef {
            name: "LISTITEMRIGHT",
            params: &["NumberOfCharsToReturn", "SemicolonSeparatedList"],
            description: "Returns rightmost chars from each entry.",
            example: "=LISTITEMRIGHT(4; [[Files]])",
            status: ImplementationStatus::Partial,
            implementation: Some(list::fn_listitemright),
        });

        self.register(FunctionDef {
            name: "LISTITEMLEFTOF",
            params: &["SearchForText", "SemicolonSeparatedList"],
            description: "Returns text left of search text for each entry.",
            example: "=LISTITEMLEFTOF(@; [[Emails]])",
            status: ImplementationStatus::Partial,
            implementation: Some(list::fn_listitemleftof),
        });

        self.register(FunctionDef {
            name: "LISTITEMRIGHTOF",
            params: &["SearchForText", "SemicolonSeparatedList"],
            description: "Returns text right of search text for each entry.",
            example: "=LISTITEMRIGHTOF(@; [[Emails]])",
            status: ImplementationStatus::Partial,
            implementation: Some(list::fn_listitemrightof),
        });

        self.register(FunctionDef {
            name: "LISTITEMREGEX",
            params: &["RegEx", "SemicolonSeparatedList"],
            description: "Returns entries matching regex.",
            example: "=LISTITEMREGEX(.*Entry\\\\d; [[Items]])",
            status: ImplementationStatus::Partial,
            implementation: Some(list::fn_listitemregex),
        });
    }

    fn register_date_functions(&mut self) {
        self.register(FunctionDef {
            name: "YEAR",
            params: &["DateValue"],
            description: "Extracts year from date.",
            example: "=YEAR([[CreatedDate]])",
            status: ImplementationStatus::Implemented,
            implementation: Some(date::fn_year),
        });

        self.register(FunctionDef {
            name: "MONTH",
            params: &["DateValue"],
            description: "Extracts month (1-12) from date.",
            example: "=MONTH([[CreatedDate]])",
            status: ImplementationStatus::Implemented,
            implementation: Some(date::fn_month),
        });

        self.register(FunctionDef {
            name: "MONTHDAY",
            params: &["DateValue"],
            description: "Extracts day of month (1-31) from date.",
            example: "=MONTHDAY([[Birthday]])",
            status: ImplementationStatus::Implemented,
            implementation: Some(date::fn_monthday),
        });

        self.register(FunctionDef {
            name: "DATEPART",
            params: &["DatePart", "DateValue"],
            description: "Extracts numeric part from date: year, weekday, yearday, monthweek, yearweek, month, day, hour, minute, second.",
            example: "=DATEPART(weekday; [[CreatedDate]])",
            status: ImplementationStatus::Implemented,
            implementation: Some(date::fn_datepart),
        });

        self.register(FunctionDef {
            name: "DATESERIAL",
            params: &["Year", "Month", "Day"],
            description: "Creates a date from year, month, day components.",
            example: "=DATESERIAL(2024; 12; 25)",
            status: ImplementationStatus::Implemented,
            implementation: Some(date::fn_dateserial),
        });

        self.register(FunctionDef {
            name: "DATEDIFF",
            params: &["ReturnUnit", "SubtractThisDate", "FromThisDate"],
            description: "Returns difference between two dates in specified unit.",
            example: "=DATEDIFF(day; [[StartDate]]; [[EndDate]])",
            status: ImplementationStatus::Implemented,
            implementation: Some(date::fn_datediff),
        });

        self.register(FunctionDef {
            name: "DATEADD",
            params: &["UnitToIncrement", "IncrementBy", "DateToIncrement", "OptionalMinDate"],
            description: "Adds/subtracts time from a date. Units: second, minute, hour, day, weekday, week, month, year.",
            example: "=DATEADD(day; 30; [[StartDate]])",
            status: ImplementationStatus::Implemented,
            implementation: Some(date::fn_dateadd),
        });

        self.register(FunctionDef {
            name: "DATELIST",
            params: &["StartDate", "EndDate"],
            description: "Generates semicolon-separated list of consecutive dates (inclusive).",
            example: "=DATELIST(2024-01-01; 2024-01-31)",
            status: ImplementationStatus::Partial,
            implementation: Some(date::fn_datelist),
        });

        self.register(FunctionDef {
            name: "DATETIMEMERGE",
            params: &["DateValue", "TimeValue"],
            description: "Merges date and time into single date/time value.",
            example: "=DATETIMEMERGE([[DateField]]; [[TimeField]])",
            status: ImplementationStatus::Partial,
            implementation: Some(date::fn_datetimemerge),
        });

        self.register(FunctionDef {
            name: "DATEROUND",
            params: &["UnitToRoundTo", "IntervalNum", "DateToRound"],
            description: "Rounds date/time to nearest interval. Units: minute, hour, day.",
            example: "=DATEROUND(hour; 1; [[Timestamp]])",
            status: ImplementationStatus::Partial,
            implementation: Some(date::fn_dateround),
        });

        self.register(FunctionDef {
            name: "MONTHLASTDAY",
            params: &["DateValue", "OptionalAddOrSubtractDay"],
            description: "Returns last day of month. Optional param adds/subtracts days.",
            example: "=MONTHLASTDAY([[InvoiceDate]]; -1)",
            status: ImplementationStatus::Implemented,
            implementation: Some(date::fn_monthlastday),
        });

        self.register(FunctionDef {
            name: "FISCALMONTH",
            params: &["FiscalYearStartMonthNumber", "DateToEvaluate"],
            description: "Returns fiscal month number based on fiscal year start.",
            example: "=FISCALMONTH(7; [[Date]])",
            status: ImplementationStatus::Partial,
            implementation: Some(date::fn_fiscalmonth),
        });

        self.register(FunctionDef {
            name: "FISCALYEAR",
            params: &["FiscalYearStartMonthNumber", "DateToEvaluate"],
            description: "Returns fiscal year based on fiscal year start month.",
            example: "=FISCALYEAR(7; [[Date]])",
            status: ImplementationStatus::Partial,
            implementation: Some(date::fn_fiscalyear),
        });

        self.register(FunctionDef {
            name: "GTDATE",
            params: &["IsThisDate", "GreaterThanThisDate"],
            description: "Returns 1 if first date > second date, 0 if false.",
            example: "=GTDATE([[DueDate]]; [[Today]])",
            status: ImplementationStatus::Implemented,
            implementation: Some(date::fn_gtdate),
        });

        self.register(FunctionDef {
            name: "GTEDATE",
            params: &["Date1", "Date2"],
            description: "Returns 1 if Date1 >= Date2, 0 if false.",
            example: "=GTEDATE([[EndDate]]; [[StartDate]])",
            status: ImplementationStatus::Implemented,
            implementation: Some(date::fn_gtedate),
        });

        self.register(FunctionDef {
            name: "LTDATE",
            params: &["IsThisDate", "LessThanThisDate"],
            description: "Returns 1 if first date < second date, 0 if false.",
            example: "=LTDATE([[Created]]; [[Deadline]])",
            status: ImplementationStatus::Implemented,
            implementation: Some(date::fn_ltdate),
        });

        self.register(FunctionDef {
            name: "LTEDATE",
            params: &["IsThisDate", "LessThanOrEqualToThisDate"],
            description: "Returns 1 if first date <= second date, 0 if false.",
            example: "=LTEDATE([[Start]]; [[End]])",
            status: ImplementationStatus::Implemented,
            implementation: Some(date::fn_ltedate),
        });

        self.register(FunctionDef {
            name: "BDATE",
            params: &["IsThisDate", "GreaterThanThisDate", "AndLessThanThisDate"],
            description: "Returns 1 if the date is between two other dates (exclusive), 0 if false.",
            example: "=BDATE([[DueDate]]; 2024-01-01; 2024-12-31)",
            status: ImplementationStatus::Implemented,
            implementation: Some(date::fn_bdate),
        });

        self.register(FunctionDef {
            name: "BEDATE",
            params: &["IsThisDate", "GreaterThanOrEqualToThisDate", "AndLessThanOrEqualToThisDate"],
            description: "Returns 1 if the date is between or equal to two other dates (inclusive), 0 if false.",
            example: "=BEDATE([[DueDate]]; 2024-01-01; 2024-12-31)",
            status: ImplementationStatus::Implemented,
            implementation: Some(date::fn_bedate),
        });
    }

    fn register_json_functions(&mut self) {
        self.register(FunctionDef {
            name: "JSONENCODE",
            params: &["TextParameter"],
            description: "Returns text JSON encoded for use as JSON property value.",
            example: "=JSONENCODE([[MultilineText]])",
            status: ImplementationStatus::Implemented,
            implementation: Some(json::fn_jsonencode),
        });

        self.register(FunctionDef {
            name: "JSONEXTRACT",
            params: &["AnyTextContainingJSON"],
            description: "Extracts first valid JSON object/array from text.",
            example: "=JSONEXTRACT([[APIResponse]])",
            status: ImplementationStatus::Implemented,
            implementation: Some(json::fn_jsonextract),
        });

        self.register(FunctionDef {
            name: "JSONQUERY",
            params: &["JSONPropertyName", "JSONContainingTheProperty"],
            description: "Queries JSON and extracts property values. Use dot notation for nested.",
            example: "=JSONQUERY(data.name; [[JsonField]])",
            status: ImplementationStatus::Implemented,
            implementation: Some(json::fn_jsonquery),
        });

        self.register(FunctionDef {
            name: "JSONUPDATE",
            params: &["ExistingJsonObject", "PropertyName", "PropertyValue"],
            description: "Adds or updates property in JSON object.",
            example: "=JSONUPDATE([[JsonObject]]; status; updated)",
            status: ImplementationStatus::Implemented,
            implementation: Some(json::fn_jsonupdate),
        });

        self.register(FunctionDef {
            name: "JSONINDEX",
            params: &["IndexToRetrieve", "ExistingJsonArray"],
            description: "Returns element at index. Positive from start, negative from end.",
            example: "=JSONINDEX(1; [[JsonArray]])",
            status: ImplementationStatus::Implemented,
            implementation: Some(json::fn_jsonindex),
        });

        self.register(FunctionDef {
            name: "JSONREMOVE",
            params: &["IndexToRemove", "ExistingJsonArray"],
            description: "Removes element at index and returns modified array.",
            example: "=JSONREMOVE(1; [[JsonArray]])",
            status: ImplementationStatus::Implemented,
            implementation: Some(json::fn_jsonremove),
        });

        self.register(FunctionDef {
            name: "JSONFIFO",
            params: &["ExistingJsonArray", "NewJsonObjectToAdd", "MaximumLength"],
            description: "Adds JSON object to array. If MaxLength exceeded, removes last.",
            example: "=JSONFIFO([[LogArray]]; {\"action\":\"login\"}; 100)",
            status: ImplementationStatus::Implemented,
            implementation: Some(json::fn_jsonfifo),
        });
    }

    fn register_format_functions(&mut self) {
        self.register(FunctionDef {
            name: "FORMAT",
            params: &["FormatString", "NumberOrDate"],
            description: "Formats number/date according to format string.",
            example: "=FORMAT(0.00; [[Price]])",
            status: ImplementationStatus::Partial,
            implementation: Some(format::fn_format),
        });
    }

    fn register_backend_functions(&mut self) {
        self.register(FunctionDef {
            name: "DATEPATTERN",
            params: &[
                "DateRecurrencePattern",
                "EndDateToGenerate",
                "RecurrenceAnchorDate",
                "StartFromStartDate",
            ],
            description: "Generates future dates based on recurrence pattern.",
            example: "=DATEPATTERN(f1w d{12345}; 2024-12-31)",
            status: ImplementationStatus::NotImplemented,
            implementation: None,
        });

        self.register(FunctionDef {
            name: "INSTANCECOUNT",
            params: &["TableID", "TableQuery"],
            description: "Returns count of instances matching query.",
            example: "=INSTANCECOUNT(TableID; tf_id_xxx[eq]Value)",
            status: ImplementationStatus::NotImplemented,
            implementation: None,
        });

        self.register(FunctionDef {
            name: "INSTANCETASKCOUNT",
            params: &["ProcessInstanceID", "TemplateTaskID"],
            description: "Returns times a task was assigned in a process instance.",
            example: "=INSTANCETASKCOUNT([[ProcessInstanceID]]; TaskID)",
            status: ImplementationStatus::NotImplemented,
            implementation: None,
        });

        self.register(FunctionDef {
            name: "INSTANCEUPDATE",
            params: &["FieldIDToUpdate", "TableIDToSearch", "SearchQuery", "NewFieldValue"],
            description: "Updates field in processes matching query.",
            example: "=INSTANCEUPDATE(FieldID; TableID; Query; NewValue)",
            status: ImplementationStatus::NotImplemented,
            implementation: None,
        });

        self.register(FunctionDef {
            name: "ISCONTEXT",
            params: &["ContextIDToTest", "AnotherOptionalID", "..."],
            description: "Tests if formula runs in specified context.",
            example: "=IF(=ISCONTEXT(FormID); Atlanta; Orlando)",
            status: ImplementationStatus::NotImplemented,
            implementation: None,
        });

        self.register(FunctionDef {
            name: "ISPUBLICUSER",
            params: &[],
            description: "Returns true if executed by non-logged-in user.",
            example: "=IF(=ISPUBLICUSER(); PublicContent; PrivateContent)",
            status: ImplementationStatus::NotImplemented,
            implementation: None,
        });

        self.register(FunctionDef {
            name: "TABLEAVG",
            params: &["FieldID", "TableID", "TableQuery"],
            description: "Returns average of column values in table.",
            example: "=TABLEAVG(FieldID; TableID; Query)",
            status: ImplementationStatus::NotImplemented,
            implementation: None,
        });

        self.register(FunctionDef {
            name: "TABLEJSON",
            params: &["NumberOfColumns", "ProcessTableID", "OptionalTableQuery"],
            description: "Returns table data as JSON array of objects.",
            example: "=TABLEJSON(5; TableID; Query)",
            status: ImplementationStatus::NotImplemented,
            implementation: None,
        });

        self.register(FunctionDef {
            name: "TABLELOOKUP",
            params: &["FieldTokenToRetrieve", "TableID", "TableQuery"],
            description: "Returns value from Process Table matching query.",
            example: "=TABLELOOKUP([[FieldToken]]; TableID; Query)",
            status: ImplementationStatus::NotImplemented,
            implementation: None,
        });

        self.register(FunctionDef {
            name: "TABLESUM",
            params: &["FieldID", "TableID", "TableQuery"],
            description: "Sums column values in table.",
            example: "=TABLESUM(FieldID; TableID; Query)",
            status: ImplementationStatus::NotImplemented,
            implementation: None,
        });

        self.register(FunctionDef {
            name: "TASKLOOKUP",
            params: &["FieldTokenToRetrieve", "TemplateTaskID", "TaskQuery"],
            description: "Queries task and returns requested attribute.",
            example: "=TASKLOOKUP([[AssignedTo]]; TaskID; Query)",
            status: ImplementationStatus::NotImplemented,
            implementation: None,
        });

        self.register(FunctionDef {
            name: "TASKREPORT",
            params: &["TextBlockID", "ProcessInstanceID", "IncludeSubprocessTask", "FilterQuery"],
            description: "Produces task report using Text Block format.",
            example: "=TASKREPORT([[TextBlockID]]; [[ProcessInstanceID]]; true; it_name[ct]task)",
            status: ImplementationStatus::NotImplemented,
            implementation: None,
        });

        self.register(FunctionDef {
            name: "WORKDAY",
            params: &["WorkScheduleID", "WorkdaysToSkip", "DateToStartEvaluatingFrom"],
            description: "Advances date to next working day based on work schedule.",
            example: "=WORKDAY([[WorkScheduleID]]; 5; [[StartDate]])",
            status: ImplementationStatus::NotImplemented,
            implementation: None,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_lookup_is_case_insensitive() {
        let registry = builtin_registry();
        assert!(registry.contains("uppercase"));
        assert!(registry.contains("!Equals"));
        assert!(!registry.contains("NOTAREALFUNCTION"));
        assert_eq!(registry.get("left").map(|d| d.name), Some("LEFT"));
    }

    #[test]
    fn test_names_sorted() {
        let names = builtin_registry().names();
        let mut sorted = names.clone();
        sorted.sort_unstable();
        assert_eq!(names, sorted);
        assert_eq!(names.first(), Some(&"!CONTAINS"));
        assert_eq!(names.last(), Some(&"YEAR"));
    }

    #[test]
    fn test_syntax() {
        assert_eq!(
            builtin_registry().syntax("left"),
            Some("=LEFT(Count; Value)".to_string())
        );
        assert_eq!(
            builtin_registry().syntax("DATESERIAL"),
            Some("=DATESERIAL(Year; Month; Day)".to_string())
        );
        assert_eq!(builtin_registry().syntax("NOPE"), None);
    }

    #[test]
    fn test_status_summary() {
        let summary = builtin_registry().status_summary();
        assert_eq!(summary.not_implemented, 13);
        assert_eq!(summary.total(), builtin_registry().len());
        assert!(summary.partial > 0);
    }

    #[test]
    fn test_every_local_function_has_implementation() {
        for def in builtin_registry().iter() {
            match def.status {
                ImplementationStatus::NotImplemented => assert!(def.implementation.is_none()),
                _ => assert!(def.implementation.is_some(), "{} has no handler", def.name),
            }
        }
    }

    #[test]
    fn test_status_from_str() {
        assert_eq!(
            "Not-Implemented".parse::<ImplementationStatus>(),
            Ok(ImplementationStatus::NotImplemented)
        );
        assert!("bogus".parse::<ImplementationStatus>().is_err());
    }
}
