//! Keyword heuristics for the refine-stage predicates.
//!
//! Both functions are pure: the same tags always give the same answer, so a stage can
//! fall back on them whenever the provider is unavailable or answers nonsense.

/// Mundane topics that rule out the interesting predicate.
pub const INTERESTING_NEGATIVE: &[&str] = &[
    // devices, logistics, support
    "ipad", "iphone", "android", "pixel", "ubreakifix", "appointment", "shipping", "logistics",
    "support", "help", "troubleshooting", "reset", "formatting",
    // accounts, passcodes, telecom
    "security", "yubikey", "2fa", "two-step", "passcode", "webauthn", "fido2", "mfa",
    "account", "password", "google fi", "sim", "sim lock", "bootloader", "unlock",
    "number porting", "carrier", "telecom",
    // printing and drivers
    "printer", "printing", "cups", "canon", "mg3620", "driver", "drivers", "airprint",
    // home networking
    "wifi", "wi-fi", "network", "ssid", "kasa", "camera",
    // health
    "health", "dermatitis", "scalp", "treatment", "itching", "battery", "swelling",
    "narcolepsy", "autoimmune", "alopecia", "bromhidrosis", "body odor", "medical research",
    // cooking
    "cooking", "recipe", "artichoke", "fig", "food safety", "edible", "digestibility",
    // household and events
    "wedding", "cake stand", "cleaning", "silver", "silver plate", "tarnish",
    // software how-to
    "image editing", "opacity", "transparency", "graphic design", "feh", "image viewer",
    "zoom controls", "command line", "cli", "arch", "arch linux", "pacman", "setxkbmap",
    "xorg", "xorg-server", "systemd", "fbdev", "xf86-video-fbdev", "install", "installation",
    "package", "package manager", "mu4e", "git", "github", "clone", "refspec", "branching",
    "permissions", "collaborators", "nvidia", "va-api", "module", "module size", "hardware",
    "graphviz", "error",
    // tooling and productivity
    "cursor", "cursor lag", "performance", "performance issues", "stability", "workspace",
    "cache", "cache management", "tmux", "key binding", "shortcut", "shortcuts",
    "productivity", "session",
    // remote access
    "ssh", "x11", "x11 forwarding", "scp", "sftp", "remote access", "terminal protocols",
    "file transfer",
    // browsers, notebooks, scraping
    "firefox", "addon", "extension", "temporary installation", "jupyter", "notebook",
    "web scraping", "scraping", "python code",
    // generic image tooling
    "dalle", "image generation", "ai art",
    // academic admin
    "paper submission", "desk rejection", "page limits", "conference policies",
    "academic guidelines", "email etiquette", "academic titles",
    // house maintenance and event linens
    "house maintenance", "pest control", "rodent", "mouse", "entry points", "apartment",
    "plumbing", "utilities", "home inspection", "table linens", "linen", "dimensions",
    "drop length", "event planning", "rectangular tables",
];

/// Topics that make the interesting predicate true outright.
pub const INTERESTING_POSITIVE: &[&str] = &[
    "torus", "deltoid", "fractal", "mandelbrot", "julia", "sierpinski", "geometry", "topology",
    "category", "functor", "adjunction", "yoneda", "diagram", "string diagram", "hasse",
    "lambda", "combinator", "repl", "fixed point", "banach", "kleene", "manifold", "geodesic",
    "information geometry", "fisher", "curvature", "tensor", "clifford", "bivector", "rotor",
    "poincar", "conformal", "hyperbolic", "fiber bundle", "bundle", "atlas", "holonomy",
    "connection", "lattice", "ouroboros", "measure", "sigma-algebra", "σ-algebra",
    "set theory",
];

/// Soft negative cues sent to the model alongside the tags.
pub const INTERESTING_NEGATIVE_HINTS: &[&str] = &[
    "logistics", "shipping", "appointment", "printer", "drivers", "password", "passcode",
    "2fa", "yubikey", "wifi", "health", "treatment", "google fi", "sim lock", "bootloader",
    "number porting", "carrier", "cooking", "food safety", "artichoke", "fig", "wedding",
    "cleaning", "silver", "tarnish", "graphic design", "image editing", "feh", "image viewer",
    "command line", "arch linux", "pacman", "setxkbmap", "xorg", "systemd", "install",
    "package", "mu4e", "git", "github", "clone", "permissions", "nvidia", "va-api", "module",
    "graphviz", "error", "cursor", "performance", "stability", "workspace", "cache", "tmux",
    "key binding", "shortcuts", "productivity", "ssh", "x11", "scp", "sftp", "remote access",
    "firefox", "addon", "extension", "jupyter", "notebook", "web scraping", "dalle",
    "image generation", "ai art", "paper submission", "desk rejection", "page limits",
    "email etiquette", "academic titles", "house maintenance", "pest control", "rodent",
    "mouse", "plumbing", "utilities", "table linens", "linen", "event planning",
];

/// Soft positive cues sent to the model alongside the tags.
pub const INTERESTING_POSITIVE_HINTS: &[&str] = &[
    "torus", "fractal", "category theory", "lambda calculus", "manifold",
    "information geometry", "rotor", "holonomy", "hyperbolic", "conformal", "aesthetics",
    "metaphysics", "ethics", "ontology", "semantics", "philosophy", "cooperation", "wisdom",
    "self-reference", "ouroboros", "symmetry", "recursion", "fixed point", "ritual", "altar",
    "cathedral",
];

/// Philosophy signals.
pub const PHILOSOPHICAL_POSITIVE: &[&str] = &[
    "philosophy", "philosophical", "metaphysics", "ontology", "epistemology", "ethics",
    "aesthetics", "meaning", "semantics", "logic", "agency", "consciousness", "mind", "values",
    "morality", "wisdom", "teleology", "free will", "personhood", "normative",
];

/// Operational topics that rule out the philosophical predicate.
pub const PHILOSOPHICAL_NEGATIVE: &[&str] = &[
    "printer", "drivers", "wifi", "account", "password", "2fa", "yubikey", "shipment",
    "logistics", "troubleshooting", "arch linux", "pacman", "install", "package", "error",
    "git", "github", "ssh", "x11", "scp", "sftp", "firefox", "extension", "notebook",
    "web scraping", "cursor", "performance", "stability", "tmux", "shortcut", "cooking",
    "food safety", "wedding", "cleaning", "tarnish", "house maintenance", "pest control",
];

const MIN_NONTRIVIAL_TAG_CHARS: usize = 5;

fn joined_lowercase(tags: &[String]) -> String {
    tags.iter()
        .map(|t| t.to_lowercase())
        .collect::<Vec<_>>()
        .join(" ")
}

fn first_match<'a>(haystack: &str, keywords: &[&'a str]) -> Option<&'a str> {
    keywords.iter().copied().find(|kw| haystack.contains(kw))
}

/// Interesting (image-prompt-worthy) versus mundane. Returns the decision and why.
pub fn is_interesting(tags: &[String]) -> (bool, String) {
    let joined = joined_lowercase(tags);
    if joined.trim().is_empty() {
        return (false, "no tags".to_string());
    }
    if let Some(kw) = first_match(&joined, INTERESTING_NEGATIVE) {
        return (false, format!("mundane keyword '{kw}'"));
    }
    if let Some(kw) = first_match(&joined, INTERESTING_POSITIVE) {
        return (true, format!("interesting keyword '{kw}'"));
    }

    let nontrivial = tags
        .iter()
        .filter(|t| t.trim().chars().count() >= MIN_NONTRIVIAL_TAG_CHARS)
        .count();
    let accepted = nontrivial >= 2 && joined.chars().any(char::is_alphabetic);
    let rationale = format!("{nontrivial} non-trivial tag(s)");
    (accepted, rationale)
}

/// Philosophically interesting or not. Returns the decision and why.
pub fn is_philosophical(tags: &[String]) -> (bool, String) {
    let joined = joined_lowercase(tags);
    if joined.trim().is_empty() {
        return (false, "no tags".to_string());
    }
    if let Some(kw) = first_match(&joined, PHILOSOPHICAL_NEGATIVE) {
        return (false, format!("operational keyword '{kw}'"));
    }
    match first_match(&joined, PHILOSOPHICAL_POSITIVE) {
        Some(kw) => (true, format!("philosophy keyword '{kw}'")),
        None => (false, "no philosophy keyword".to_string()),
    }
}
