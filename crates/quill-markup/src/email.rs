//! `{% email user@example.com %}` address obfuscation.
//!
//! The address never appears whole in the page. It is split into four parts,
//! each ROT-N encoded with N taken from the length of one part of the
//! generated class names, and stored in randomly named `data-*` attributes.
//! A small script injected once per page reassembles it on hover or focus.

use std::fmt::Write as _;

use rand::RngExt;

use crate::error::MarkupError;

const ALPHANUMERIC: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
const LETTERS: &[u8] = b"abcdefghijklmnopqrstuvwxyz";

/// Placeholder shown until the script decodes the address.
const PLACEHOLDER: &str = "XXXXXXXXXXXXXXXX";

/// Per-build random identifiers shared by every obfuscated address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObfuscationKeys {
    span_parts: [String; 2],
    link_parts: [String; 2],
    rot_fn: String,
    decode_fn: String,
    attach_fn: String,
    data_attrs: [String; 4],
    vars: [String; 4],
}

impl ObfuscationKeys {
    /// Generate fresh keys from the thread-local generator.
    #[must_use]
    pub fn generate() -> Self {
        Self::generate_with(&mut rand::rng())
    }

    /// Generate keys from `rng`.
    pub fn generate_with<R: rand::Rng + ?Sized>(rng: &mut R) -> Self {
        let span_parts = [identifier(rng, 3..=16), identifier(rng, 3..=16)];
        let link_parts = [identifier(rng, 3..=16), identifier(rng, 3..=16)];
        Self {
            span_parts,
            link_parts,
            rot_fn: identifier(rng, 7..=15),
            decode_fn: identifier(rng, 7..=15),
            attach_fn: identifier(rng, 7..=15),
            data_attrs: std::array::from_fn(|_| format!("data-{}", identifier(rng, 5..=11))),
            vars: std::array::from_fn(|_| identifier(rng, 5..=11)),
        }
    }

    /// Class of the `<span>` carrying the encoded parts.
    #[must_use]
    pub fn span_class(&self) -> String {
        format!("{}-{}", self.span_parts[0], self.span_parts[1])
    }

    /// Class of the wrapping `<a>`.
    #[must_use]
    pub fn link_class(&self) -> String {
        format!("{}-{}", self.link_parts[0], self.link_parts[1])
    }

    /// Names of the four `data-*` attributes (mailto, user, domain, TLD).
    #[must_use]
    pub fn data_attrs(&self) -> &[String; 4] {
        &self.data_attrs
    }

    /// Opening tag that starts every obfuscated link.
    #[must_use]
    pub fn link_open_tag(&self) -> String {
        format!(r##"<a href="#" class="{}">"##, self.link_class())
    }
}

/// Lowercase letter followed by `len` random lowercase alphanumerics.
fn identifier<R: rand::Rng + ?Sized>(rng: &mut R, len: std::ops::RangeInclusive<usize>) -> String {
    let len = rng.random_range(len);
    let mut id = String::with_capacity(len + 1);
    id.push(char::from(LETTERS[rng.random_range(0..LETTERS.len())]));
    for _ in 0..len {
        id.push(char::from(ALPHANUMERIC[rng.random_range(0..ALPHANUMERIC.len())]));
    }
    id
}

/// Shift ASCII letters by `n` positions, keeping case. Other characters pass
/// through unchanged.
#[must_use]
pub fn rot_n(text: &str, n: usize) -> String {
    let shift = u8::try_from(n % 26).unwrap_or(0);
    text.chars()
        .map(|c| {
            let Ok(byte) = u8::try_from(c) else {
                return c;
            };
            let base = match byte {
                b'a'..=b'z' => b'a',
                b'A'..=b'Z' => b'A',
                _ => return c,
            };
            char::from(base + (byte - base + shift) % 26)
        })
        .collect()
}

/// Render the obfuscated link for `email`.
pub fn obfuscate(email: &str, keys: &ObfuscationKeys) -> Result<String, MarkupError> {
    let email = email.trim();
    let (user, domain) = email
        .split_once('@')
        .filter(|(user, domain)| !user.is_empty() && !domain.is_empty() && !domain.contains('@'))
        .ok_or_else(|| MarkupError::InvalidEmail(email.to_owned()))?;
    let (base, tld) = domain
        .split_once('.')
        .filter(|(base, tld)| !base.is_empty() && !tld.is_empty())
        .ok_or_else(|| MarkupError::InvalidEmailDomain(domain.to_owned()))?;

    let encoded = [
        rot_n("mailto", keys.span_parts[0].len()),
        rot_n(user, keys.span_parts[1].len()),
        rot_n(base, keys.link_parts[0].len()),
        rot_n(tld, keys.link_parts[1].len()),
    ];

    let mut html = keys.link_open_tag();
    let _ = write!(html, r#"<span class="{}""#, keys.span_class());
    for (attr, value) in keys.data_attrs.iter().zip(&encoded) {
        let _ = write!(
            html,
            r#" {attr}="{}""#,
            html_escape::encode_double_quoted_attribute(value)
        );
    }
    let _ = write!(html, ">{PLACEHOLDER}</span></a>");
    Ok(html)
}

/// `<style>` and decoding `<script>` for one page.
#[must_use]
pub fn assets(keys: &ObfuscationKeys) -> String {
    let span_class = keys.span_class();
    let link_class = keys.link_class();
    let ObfuscationKeys {
        rot_fn,
        decode_fn,
        attach_fn,
        data_attrs: attrs,
        vars,
        ..
    } = keys;

    format!(
        "<style>span.{span_class} {{ display: inline-block; }}</style>\
         <script>(function(){{\
         function {rot_fn}(s,n){{var r='';for(var i=0;i<s.length;i++){{var c=s.charCodeAt(i);\
         if(c>=65&&c<=90){{r+=String.fromCharCode((c-65-n+26)%26+65);}}\
         else if(c>=97&&c<=122){{r+=String.fromCharCode((c-97-n+26)%26+97);}}\
         else r+=s[i];}}return r;}}\
         function {decode_fn}(sp,lnk){{var spParts=sp.className.split('-');var lnkParts=lnk.className.split('-');\
         var {v0}=sp.getAttribute('{a0}');var {v1}=sp.getAttribute('{a1}');\
         var {v2}=sp.getAttribute('{a2}');var {v3}=sp.getAttribute('{a3}');\
         var mailto={rot_fn}({v0},spParts[0].length);var user={rot_fn}({v1},spParts[1].length);\
         var domainBase={rot_fn}({v2},lnkParts[0].length);var tld={rot_fn}({v3},lnkParts[1].length);\
         return mailto+':'+user+'@'+domainBase+'.'+tld;}}\
         function {attach_fn}(){{var els=document.querySelectorAll('a.{link_class}');\
         var handler=function(){{var sp=this.querySelector('span.{span_class}');\
         if(sp&&!this.dataset.d){{var val={decode_fn}(sp,this);this.href=val;\
         sp.textContent=val.replace('mailto:','');this.dataset.d='1';}}}};\
         for(var i=0;i<els.length;i++){{els[i].addEventListener('mouseover',handler);\
         els[i].addEventListener('focus',handler);}}}}\
         if(document.readyState==='loading'){{document.addEventListener('DOMContentLoaded',{attach_fn});}}\
         else{{{attach_fn}();}}\
         }})();</script>",
        v0 = vars[0],
        v1 = vars[1],
        v2 = vars[2],
        v3 = vars[3],
        a0 = attrs[0],
        a1 = attrs[1],
        a2 = attrs[2],
        a3 = attrs[3],
    )
}

/// Insert [`assets`] once, directly before the first obfuscated link.
///
/// Returns `None` when the page has no obfuscated link or already carries the
/// assets.
#[must_use]
pub fn inject_assets(html: &str, keys: &ObfuscationKeys) -> Option<String> {
    let open_tag = keys.link_open_tag();
    let position = html.find(&open_tag)?;
    let style_marker = format!("<style>span.{} ", keys.span_class());
    if html.contains(&style_marker) {
        return None;
    }

    let mut out = String::with_capacity(html.len() + 2048);
    out.push_str(&html[..position]);
    out.push_str(&assets(keys));
    out.push_str(&html[position..]);
    Some(out)
}
